use crate::decode;
use crate::values::{
    BatteryType, ChargingMethod, ChargingModeController, ChargingState, Decimal, DecodeError,
    Fault, LoadWorkingMode, ProductType, Toggle,
};

/// Enumerations a register field can decode into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumKind {
    Toggle,
    ProductType,
    BatteryType,
    ChargingState,
    LoadWorkingMode,
    ChargingModeController,
    ChargingMethod,
}

impl EnumKind {
    fn decode(self, metric: &'static str, word: u16, pattern: u16) -> Result<Value, DecodeError> {
        Ok(match self {
            EnumKind::Toggle => Toggle::decode(metric, word, pattern)?.into(),
            EnumKind::ProductType => ProductType::decode(metric, word, pattern)?.into(),
            EnumKind::BatteryType => BatteryType::decode(metric, word, pattern)?.into(),
            EnumKind::ChargingState => ChargingState::decode(metric, word, pattern)?.into(),
            EnumKind::LoadWorkingMode => LoadWorkingMode::decode(metric, word, pattern)?.into(),
            EnumKind::ChargingModeController => {
                ChargingModeController::decode(metric, word, pattern)?.into()
            }
            EnumKind::ChargingMethod => ChargingMethod::decode(metric, word, pattern)?.into(),
        })
    }

    fn name(self) -> &'static str {
        match self {
            EnumKind::Toggle => "toggle",
            EnumKind::ProductType => "product-type",
            EnumKind::BatteryType => "battery-type",
            EnumKind::ChargingState => "charging-state",
            EnumKind::LoadWorkingMode => "load-working-mode",
            EnumKind::ChargingModeController => "charging-mode-controller",
            EnumKind::ChargingMethod => "charging-method",
        }
    }
}

/// How the raw register(s) of a metric turn into a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// A whole register, divided by `10^decimals`.
    Word { decimals: u8 },
    /// One byte of a register, optionally masked.
    Byte { high: bool, mask: u8 },
    /// One sign-and-magnitude byte of a register.
    SignedByte { high: bool },
    /// Two registers forming a 32 bit number, divided by `10^decimals`.
    DoubleWord { decimals: u8 },
    /// Two registers holding a dotted version number.
    Version,
    /// A fixed-length string, two characters per register.
    Text { chars: u16 },
    /// A bit field of a register looked up in an enumeration.
    Enum { kind: EnumKind, shift: u8, mask: u16 },
    /// Two registers, the first of which holds fault flags.
    Faults,
}

impl DataType {
    // Convenience aliases for nicely tabulated `for_each_metric` macro definition below.
    pub const U16: Self = Self::Word { decimals: 0 };
    pub const D1: Self = Self::Word { decimals: 1 };
    pub const D2: Self = Self::Word { decimals: 2 };
    pub const D4: Self = Self::Word { decimals: 4 };
    pub const HI8: Self = Self::Byte { high: true, mask: 0xFF };
    pub const LO8: Self = Self::Byte { high: false, mask: 0xFF };
    pub const HI7: Self = Self::Byte { high: true, mask: 0x7F };
    pub const TEMP_HI: Self = Self::SignedByte { high: true };
    pub const TEMP_LO: Self = Self::SignedByte { high: false };
    pub const U32: Self = Self::DoubleWord { decimals: 0 };
    pub const U32_D3: Self = Self::DoubleWord { decimals: 3 };
    pub const VERSION: Self = Self::Version;
    pub const TEXT16: Self = Self::Text { chars: 16 };
    pub const FAULTS: Self = Self::Faults;
    pub const PRODUCT: Self = Self::enumeration(EnumKind::ProductType, 0, 0xFF);
    pub const BATTERY: Self = Self::enumeration(EnumKind::BatteryType, 0, 0xFFFF);
    pub const CHG_STATE: Self = Self::enumeration(EnumKind::ChargingState, 0, 0xFF);
    pub const LOAD_MODE: Self = Self::enumeration(EnumKind::LoadWorkingMode, 0, 0xFFFF);
    pub const B15_TOGGLE: Self = Self::enumeration(EnumKind::Toggle, 15, 1);
    pub const B9_TOGGLE: Self = Self::enumeration(EnumKind::Toggle, 9, 1);
    pub const B8_TOGGLE: Self = Self::enumeration(EnumKind::Toggle, 8, 1);
    pub const B2_TOGGLE: Self = Self::enumeration(EnumKind::Toggle, 2, 1);
    pub const B10_CHG_CTRL: Self = Self::enumeration(EnumKind::ChargingModeController, 10, 1);
    pub const B0_CHG_METHOD: Self = Self::enumeration(EnumKind::ChargingMethod, 0, 1);

    const fn enumeration(kind: EnumKind, shift: u8, mask: u16) -> Self {
        Self::Enum { kind, shift, mask }
    }

    /// The read this data type needs from the register source.
    pub const fn width(&self) -> Width {
        match self {
            Self::Word { .. } | Self::Byte { .. } | Self::SignedByte { .. } | Self::Enum { .. } => {
                Width::Word
            }
            Self::DoubleWord { .. } | Self::Version | Self::Faults => Width::Words(2),
            Self::Text { chars } => Width::Text(*chars),
        }
    }

    /// Number of registers covered by this data type.
    pub const fn registers(&self) -> u16 {
        match self.width() {
            Width::Word => 1,
            Width::Words(count) => count,
            Width::Text(chars) => chars.div_ceil(2),
        }
    }

    pub fn decode(&self, metric: &'static str, raw: Raw) -> Result<Value, DecodeError> {
        Ok(match (*self, raw) {
            (Self::Word { decimals: 0 }, Raw::Word(w)) => Value::U16(w),
            (Self::Word { decimals }, Raw::Word(w)) => {
                Value::Decimal(Decimal::new(u32::from(w), decimals))
            }
            (Self::Byte { high, mask }, Raw::Word(w)) => Value::U8(byte(w, high) & mask),
            (Self::SignedByte { high }, Raw::Word(w)) => {
                Value::I8(decode::sign_magnitude(byte(w, high)))
            }
            (Self::Enum { kind, shift, mask }, Raw::Word(w)) => {
                kind.decode(metric, w, decode::field(w, shift, mask))?
            }
            (Self::DoubleWord { decimals }, Raw::Words(ws)) => {
                let [high, low] = pair(metric, &ws)?;
                let number = decode::double_word(high, low);
                if decimals == 0 {
                    Value::U32(number)
                } else {
                    Value::Decimal(Decimal::new(number, decimals))
                }
            }
            (Self::Version, Raw::Words(ws)) => Value::Text(decode::version(pair(metric, &ws)?)),
            (Self::Faults, Raw::Words(ws)) => {
                // The second register is reserved.
                let [flags, _] = pair(metric, &ws)?;
                Value::Faults(Fault::decompose(flags))
            }
            (Self::Text { .. }, Raw::Text(text)) => {
                Value::Text(decode::trim_text(&text).to_string())
            }
            (_, raw) => {
                return Err(DecodeError::ShortRead {
                    metric,
                    expected: self.registers(),
                    got: raw.registers(),
                });
            }
        })
    }
}

fn byte(word: u16, high: bool) -> u8 {
    if high { decode::high_byte(word) } else { decode::low_byte(word) }
}

fn pair(metric: &'static str, words: &[u16]) -> Result<[u16; 2], DecodeError> {
    match *words {
        [first, second] => Ok([first, second]),
        _ => Err(DecodeError::ShortRead { metric, expected: 2, got: words.len() }),
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Word { decimals: 0 } => f.write_str("u16"),
            Self::Word { decimals } => write!(f, "u16/{}", 10u32.pow(decimals.into())),
            Self::Byte { high, mask } => {
                write!(f, "u8({}", if high { "hi" } else { "lo" })?;
                if mask != 0xFF {
                    write!(f, "&{mask:#04x}")?;
                }
                f.write_str(")")
            }
            Self::SignedByte { high } => write!(f, "s8({})", if high { "hi" } else { "lo" }),
            Self::DoubleWord { decimals: 0 } => f.write_str("u32"),
            Self::DoubleWord { decimals } => write!(f, "u32/{}", 10u32.pow(decimals.into())),
            Self::Version => f.write_str("version"),
            Self::Text { chars } => write!(f, "text[{chars}]"),
            Self::Enum { kind, shift, mask } => {
                write!(f, "{}(>>{shift}&{mask:#x})", kind.name())
            }
            Self::Faults => f.write_str("faults"),
        }
    }
}

/// The kind of read a [`DataType`] requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Word,
    Words(u16),
    Text(u16),
}

/// Raw data as it was returned by the register source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Raw {
    Word(u16),
    Words(Vec<u16>),
    Text(String),
}

impl Raw {
    fn registers(&self) -> usize {
        match self {
            Raw::Word(_) => 1,
            Raw::Words(ws) => ws.len(),
            Raw::Text(text) => text.chars().count().div_ceil(2),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    Decimal(Decimal),
    Text(String),
    Toggle(Toggle),
    ProductType(ProductType),
    BatteryType(BatteryType),
    ChargingState(ChargingState),
    LoadWorkingMode(LoadWorkingMode),
    ChargingModeController(ChargingModeController),
    ChargingMethod(ChargingMethod),
    Faults(Vec<Fault>),
}

impl Value {
    /// Short name of the variant, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::I8(_) => "i8",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Toggle(_) => "toggle",
            Value::ProductType(_) => "product type",
            Value::BatteryType(_) => "battery type",
            Value::ChargingState(_) => "charging state",
            Value::LoadWorkingMode(_) => "load working mode",
            Value::ChargingModeController(_) => "charging mode controller",
            Value::ChargingMethod(_) => "charging method",
            Value::Faults(_) => "fault list",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::U8(n) => write!(f, "{n}"),
            Value::U16(n) => write!(f, "{n}"),
            Value::U32(n) => write!(f, "{n}"),
            Value::I8(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Toggle(v) => write!(f, "{v}"),
            Value::ProductType(v) => write!(f, "{v}"),
            Value::BatteryType(v) => write!(f, "{v}"),
            Value::ChargingState(v) => write!(f, "{v}"),
            Value::LoadWorkingMode(v) => write!(f, "{v}"),
            Value::ChargingModeController(v) => write!(f, "{v}"),
            Value::ChargingMethod(v) => write!(f, "{v}"),
            Value::Faults(faults) => {
                let mut first = true;
                for fault in faults {
                    if !std::mem::take(&mut first) {
                        f.write_str(", ")?;
                    }
                    write!(f, "{fault}")?;
                }
                Ok(())
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::U8(n) => serializer.serialize_u8(*n),
            Value::U16(n) => serializer.serialize_u16(*n),
            Value::U32(n) => serializer.serialize_u32(*n),
            Value::I8(n) => serializer.serialize_i8(*n),
            Value::Decimal(d) => serde::Serialize::serialize(d, serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Toggle(v) => serde::Serialize::serialize(v, serializer),
            Value::ProductType(v) => serde::Serialize::serialize(v, serializer),
            Value::BatteryType(v) => serde::Serialize::serialize(v, serializer),
            Value::ChargingState(v) => serde::Serialize::serialize(v, serializer),
            Value::LoadWorkingMode(v) => serde::Serialize::serialize(v, serializer),
            Value::ChargingModeController(v) => serde::Serialize::serialize(v, serializer),
            Value::ChargingMethod(v) => serde::Serialize::serialize(v, serializer),
            Value::Faults(v) => serde::Serialize::serialize(v, serializer),
        }
    }
}

macro_rules! scalar_value {
    ($($variant:ident($ty:ty)),*) => {
        $(impl TryFrom<Value> for $ty {
            type Error = Value;
            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        })*
    };
}

scalar_value!(U8(u8), U16(u16), U32(u32), I8(i8), Decimal(Decimal), Text(String));

/// A named register field and the rule used to decode it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metric {
    pub address: u16,
    pub name: &'static str,
    pub data_type: DataType,
    pub unit: &'static str,
    pub description: &'static str,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<&'static Metric> {
        METRICS.iter().find(|m| m.name == name)
    }

    /// All metrics decoded from the register at `address`.
    pub fn at_address(address: u16) -> impl Iterator<Item = &'static Metric> {
        METRICS.iter().filter(move |m| m.address == address)
    }

    pub fn decode(&self, raw: Raw) -> Result<Value, DecodeError> {
        self.data_type.decode(self.name, raw)
    }
}

macro_rules! for_each_metric {
    ($m:ident) => {
        $m! {
            0x000A: HI8, MAX_SYSTEM_VOLTAGE, max_system_voltage -> u8, "V",
                "Highest battery system voltage supported";
            0x000A: LO8, RATED_CHARGING_CURRENT, rated_charging_current -> u8, "A",
                "Rated charging current";
            0x000B: HI8, RATED_DISCHARGING_CURRENT, rated_discharging_current -> u8, "A",
                "Rated discharging current";
            0x000B: PRODUCT, PRODUCT_TYPE, product_type -> ProductType, "",
                "Product type";
            0x000C: TEXT16, PRODUCT_MODEL, product_model -> String, "",
                "Product model name";
            0x0014: VERSION, SOFTWARE_VERSION, software_version -> String, "",
                "Software version";
            0x0016: VERSION, HARDWARE_VERSION, hardware_version -> String, "",
                "Hardware version";
            0x0018: U32, SERIAL_NUMBER, serial_number -> u32, "",
                "Product serial number";
            0x001A: U16, DEVICE_ADDRESS, device_address -> u16, "",
                "Modbus device address";
            0x0100: U16, BATTERY_PERCENTAGE, battery_percentage -> u16, "%",
                "Battery state of charge";
            0x0101: D1, BATTERY_VOLTAGE, battery_voltage -> Decimal, "V",
                "Battery voltage";
            0x0102: D2, CHARGING_CURRENT, charging_current -> Decimal, "A",
                "Charging current to the battery";
            0x0103: TEMP_HI, CONTROLLER_TEMPERATURE, controller_temperature -> i8, "°C",
                "Controller temperature";
            0x0103: TEMP_LO, BATTERY_TEMPERATURE, battery_temperature -> i8, "°C",
                "Battery temperature";
            0x0104: D1, LOAD_VOLTAGE, load_voltage -> Decimal, "V",
                "Street light (load) voltage";
            0x0105: D2, LOAD_CURRENT, load_current -> Decimal, "A",
                "Street light (load) current";
            0x0106: U16, LOAD_POWER, load_power -> u16, "W",
                "Street light (load) power";
            0x0107: D1, SOLAR_VOLTAGE, solar_voltage -> Decimal, "V",
                "Solar panel voltage";
            0x0108: D2, SOLAR_CURRENT, solar_current -> Decimal, "A",
                "Solar panel current";
            0x0109: U16, CHARGING_POWER, charging_power -> u16, "W",
                "Charging power";
            0x010B: D1, BATTERY_MIN_VOLTAGE_TODAY, battery_min_voltage_today -> Decimal, "V",
                "Minimum battery voltage of the current day";
            0x010C: D1, BATTERY_MAX_VOLTAGE_TODAY, battery_max_voltage_today -> Decimal, "V",
                "Maximum battery voltage of the current day";
            0x010D: D2, MAX_CHARGING_CURRENT_TODAY, max_charging_current_today -> Decimal, "A",
                "Maximum charging current of the current day";
            0x010E: D2, MAX_DISCHARGING_CURRENT_TODAY, max_discharging_current_today -> Decimal, "A",
                "Maximum discharging current of the current day";
            0x010F: U16, MAX_CHARGING_POWER_TODAY, max_charging_power_today -> u16, "W",
                "Maximum charging power of the current day";
            0x0110: U16, MIN_CHARGING_POWER_TODAY, min_charging_power_today -> u16, "W",
                "Minimum charging power of the current day";
            0x0111: U16, CHARGING_AMPHOURS_TODAY, charging_amphours_today -> u16, "Ah",
                "Charging amp-hours of the current day";
            0x0112: U16, DISCHARGING_AMPHOURS_TODAY, discharging_amphours_today -> u16, "Ah",
                "Discharging amp-hours of the current day";
            0x0113: D2, POWER_GENERATION_TODAY, power_generation_today -> Decimal, "kWh",
                "Power generation of the current day";
            0x0114: D4, POWER_CONSUMPTION_TODAY, power_consumption_today -> Decimal, "kWh",
                "Power consumption of the current day";
            0x0115: U16, TOTAL_OPERATING_DAYS, total_operating_days -> u16, "d",
                "Total number of operating days";
            0x0116: U16, TOTAL_BATTERY_OVER_DISCHARGES, total_battery_over_discharges -> u16, "",
                "Total number of battery over-discharges";
            0x0117: U16, TOTAL_BATTERY_FULL_CHARGES, total_battery_full_charges -> u16, "",
                "Total number of battery full charges";
            0x0118: U32, TOTAL_BATTERY_CHARGE_AMPHOURS, total_battery_charge_amphours -> u32, "Ah",
                "Total charging amp-hours of the battery";
            0x011A: U32, TOTAL_BATTERY_DISCHARGE_AMPHOURS, total_battery_discharge_amphours -> u32, "Ah",
                "Total discharging amp-hours of the battery";
            0x011C: U32_D3, CUMULATIVE_POWER_GENERATION, cumulative_power_generation -> Decimal, "kWh",
                "Cumulative power generation";
            0x011E: U32_D3, CUMULATIVE_POWER_CONSUMPTION, cumulative_power_consumption -> Decimal, "kWh",
                "Cumulative power consumption";
            0x0120: HI7, STREET_LIGHT_BRIGHTNESS, street_light_brightness -> u8, "%",
                "Street light brightness";
            0x0120: B15_TOGGLE, STREET_LIGHT_STATUS, street_light_status -> Toggle, "",
                "Street light status";
            0x0120: CHG_STATE, CHARGING_STATE, charging_state -> ChargingState, "",
                "Charging state";
            0x0121: FAULTS, CONTROLLER_FAULT_INFORMATION, controller_fault_information -> Vec<Fault>, "",
                "Active controller faults";
            0xE002: U16, NOMINAL_BATTERY_CAPACITY, nominal_battery_capacity -> u16, "Ah",
                "Nominal battery capacity";
            0xE003: HI8, SYSTEM_VOLTAGE_SETTING, system_voltage_setting -> u8, "V",
                "Configured system voltage";
            0xE003: LO8, RECOGNIZED_VOLTAGE, recognized_voltage -> u8, "V",
                "Recognized system voltage";
            0xE004: BATTERY, BATTERY_TYPE, battery_type -> BatteryType, "",
                "Battery type";
            0xE005: D1, OVER_VOLTAGE_THRESHOLD, over_voltage_threshold -> Decimal, "V",
                "Over-voltage threshold";
            0xE006: D1, CHARGING_VOLTAGE_LIMIT, charging_voltage_limit -> Decimal, "V",
                "Charging voltage limit";
            0xE007: D1, EQUALIZING_CHARGING_VOLTAGE, equalizing_charging_voltage -> Decimal, "V",
                "Equalizing charging voltage";
            0xE008: D1, BOOST_CHARGING_VOLTAGE, boost_charging_voltage -> Decimal, "V",
                "Boost charging voltage";
            0xE009: D1, FLOATING_VOLTAGE, floating_voltage -> Decimal, "V",
                "Floating charging voltage";
            0xE00A: D1, BOOST_CHARGING_RECOVERY_VOLTAGE, boost_charging_recovery_voltage -> Decimal, "V",
                "Boost charging recovery voltage";
            0xE00B: D1, OVER_DISCHARGE_RECOVERY_VOLTAGE, over_discharge_recovery_voltage -> Decimal, "V",
                "Over-discharge recovery voltage";
            0xE00C: D1, UNDER_VOLTAGE_WARNING_LEVEL, under_voltage_warning_level -> Decimal, "V",
                "Under-voltage warning level";
            0xE00D: D1, OVER_DISCHARGE_VOLTAGE, over_discharge_voltage -> Decimal, "V",
                "Over-discharge voltage";
            0xE00E: D1, DISCHARGING_LIMIT_VOLTAGE, discharging_limit_voltage -> Decimal, "V",
                "Discharging limit voltage";
            0xE00F: HI8, END_OF_CHARGE_SOC, end_of_charge_soc -> u8, "%",
                "End of charge state of charge";
            0xE00F: LO8, END_OF_DISCHARGE_SOC, end_of_discharge_soc -> u8, "%",
                "End of discharge state of charge";
            0xE010: U16, OVER_DISCHARGE_TIME_DELAY, over_discharge_time_delay -> u16, "s",
                "Over-discharge time delay";
            0xE011: U16, EQUALIZING_CHARGING_TIME, equalizing_charging_time -> u16, "min",
                "Equalizing charging time";
            0xE012: U16, BOOST_CHARGING_TIME, boost_charging_time -> u16, "min",
                "Boost charging time";
            0xE013: U16, EQUALIZING_CHARGING_INTERVAL, equalizing_charging_interval -> u16, "d",
                "Interval between equalizing charges";
            0xE014: U16, TEMPERATURE_COMPENSATION_FACTOR, temperature_compensation_factor -> u16, "mV/°C/2V",
                "Temperature compensation factor";
            0xE015: U16, FIRST_STAGE_OPERATING_DURATION, first_stage_operating_duration -> u16, "h",
                "Load first stage operating duration";
            0xE016: U16, FIRST_STAGE_OPERATING_POWER, first_stage_operating_power -> u16, "%",
                "Load first stage operating power";
            0xE017: U16, SECOND_STAGE_OPERATING_DURATION, second_stage_operating_duration -> u16, "h",
                "Load second stage operating duration";
            0xE018: U16, SECOND_STAGE_OPERATING_POWER, second_stage_operating_power -> u16, "%",
                "Load second stage operating power";
            0xE019: U16, THIRD_STAGE_OPERATING_DURATION, third_stage_operating_duration -> u16, "h",
                "Load third stage operating duration";
            0xE01A: U16, THIRD_STAGE_OPERATING_POWER, third_stage_operating_power -> u16, "%",
                "Load third stage operating power";
            0xE01B: U16, MORNING_ON_OPERATING_DURATION, morning_on_operating_duration -> u16, "h",
                "Load morning-on operating duration";
            0xE01C: U16, MORNING_ON_OPERATING_POWER, morning_on_operating_power -> u16, "%",
                "Load morning-on operating power";
            0xE01D: LOAD_MODE, LOAD_WORKING_MODE, load_working_mode -> LoadWorkingMode, "",
                "Load working mode";
            0xE01E: U16, LIGHT_CONTROL_DELAY, light_control_delay -> u16, "min",
                "Light control delay";
            0xE01F: U16, LIGHT_CONTROL_VOLTAGE, light_control_voltage -> u16, "V",
                "Light control voltage";
            0xE020: D2, LED_LOAD_CURRENT_SETTING, led_load_current_setting -> Decimal, "A",
                "LED load current setting";
            0xE021: B10_CHG_CTRL, CHARGING_MODE_CONTROLLED_BY, charging_mode_controlled_by -> ChargingModeController, "",
                "What controls the charging mode";
            0xE021: B9_TOGGLE, SPECIAL_POWER_CONTROL_STATE, special_power_control_state -> Toggle, "",
                "Special power control";
            0xE021: B8_TOGGLE, EACH_NIGHT_ON_FUNCTION_STATE, each_night_on_function_state -> Toggle, "",
                "Each night on function";
            0xE021: B2_TOGGLE, NO_CHARGING_BELOW_FREEZING, no_charging_below_freezing -> Toggle, "",
                "No charging below 0°C";
            0xE021: B0_CHG_METHOD, CHARGING_METHOD, charging_method -> ChargingMethod, "",
                "Charging method";
        }
    };
}

pub(crate) use for_each_metric;

macro_rules! make_lists {
    ($($addr:literal: $dt:ident, $konst:ident, $accessor:ident -> $ty:ty, $unit:literal, $desc:literal;)+) => {
        impl Metric {
            $(pub const $konst: Metric = Metric {
                address: $addr,
                name: stringify!($accessor),
                data_type: DataType::$dt,
                unit: $unit,
                description: $desc,
            };)+
        }

        pub static METRICS: &[Metric] = &[$(Metric::$konst),+];
    };
}

for_each_metric!(make_lists);
