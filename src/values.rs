//! Typed values produced by the decoder: fixed-point decimals, enumerated states and faults.

use crate::registers::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "`{metric}` register value {word:#06x} carries {kind} pattern {pattern:#x} which has no \
         known meaning"
    )]
    UnknownVariant { metric: &'static str, kind: &'static str, word: u16, pattern: u16 },
    #[error("`{metric}` needs {expected} registers, but the source returned {got}")]
    ShortRead { metric: &'static str, expected: u16, got: usize },
    #[error("`{metric}` decoded to a {found} value, which does not fit its accessor")]
    Mismatch { metric: &'static str, found: &'static str },
}

/// A register value divided by a fixed power of ten.
///
/// Kept as an integer mantissa so that the value prints exactly as the device reported it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: u32,
    decimals: u8,
}

impl Decimal {
    pub const fn new(mantissa: u32, decimals: u8) -> Self {
        Self { mantissa, decimals }
    }

    pub const fn mantissa(&self) -> u32 {
        self.mantissa
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn to_f64(&self) -> f64 {
        f64::from(self.mantissa) / 10f64.powi(i32::from(self.decimals))
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let divisor = 10u32.pow(u32::from(self.decimals));
        let width = usize::from(self.decimals);
        write!(f, "{}.{:0width$}", self.mantissa / divisor, self.mantissa % divisor)
    }
}

impl serde::Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            Hash,
            strum::VariantNames,
            strum::VariantArray,
            strum::FromRepr,
            strum::IntoStaticStr,
            strum::EnumString,
            strum::Display,
            num_derive::ToPrimitive,
        )]
        #[strum(serialize_all = "kebab-case")]
        #[repr(u16)]
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),*
        }

        impl $name {
            /// Map a pattern extracted from the register `word` to its variant.
            pub fn decode(metric: &'static str, word: u16, pattern: u16) -> Result<Self, DecodeError> {
                Self::from_repr(pattern).ok_or(DecodeError::UnknownVariant {
                    metric,
                    kind: stringify!($name),
                    word,
                    pattern,
                })
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Value {
                Value::$name(value)
            }
        }

        impl TryFrom<Value> for $name {
            type Error = Value;
            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$name(v) => Ok(v),
                    other => Err(other),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(<&'static str>::from(self))
            }
        }
    };
}

string_enum! {
    pub enum Toggle {
        Off = 0,
        On = 1,
    }
}

string_enum! {
    pub enum ProductType {
        ChargeController = 0,
        Inverter = 1,
    }
}

string_enum! {
    /// Battery chemistry the controller is configured for.
    ///
    /// These codes have not been confirmed against hardware yet and should be treated as
    /// provisional.
    pub enum BatteryType {
        Open = 1,
        Sealed = 2,
        Gel = 3,
        Lithium = 4,
        SelfCustomized = 5,
    }
}

string_enum! {
    pub enum ChargingState {
        Deactivated = 0,
        Activated = 1,
        MpptTracking = 2,
        Equalizing = 3,
        Boosting = 4,
        Floating = 5,
        CurrentLimiting = 6,
    }
}

string_enum! {
    /// How the load output is scheduled after dusk.
    pub enum LoadWorkingMode {
        /// Load is on from dusk to dawn.
        SoleLightControl = 0,
        #[strum(serialize = "off-after-1h")]
        OffAfter1h = 1,
        #[strum(serialize = "off-after-2h")]
        OffAfter2h = 2,
        #[strum(serialize = "off-after-3h")]
        OffAfter3h = 3,
        #[strum(serialize = "off-after-4h")]
        OffAfter4h = 4,
        #[strum(serialize = "off-after-5h")]
        OffAfter5h = 5,
        #[strum(serialize = "off-after-6h")]
        OffAfter6h = 6,
        #[strum(serialize = "off-after-7h")]
        OffAfter7h = 7,
        #[strum(serialize = "off-after-8h")]
        OffAfter8h = 8,
        #[strum(serialize = "off-after-9h")]
        OffAfter9h = 9,
        #[strum(serialize = "off-after-10h")]
        OffAfter10h = 10,
        #[strum(serialize = "off-after-11h")]
        OffAfter11h = 11,
        #[strum(serialize = "off-after-12h")]
        OffAfter12h = 12,
        #[strum(serialize = "off-after-13h")]
        OffAfter13h = 13,
        #[strum(serialize = "off-after-14h")]
        OffAfter14h = 14,
        Manual = 15,
        Debug = 16,
        NormalOn = 17,
    }
}

string_enum! {
    /// What decides the charging stage transitions.
    pub enum ChargingModeController {
        /// State of charge.
        Soc = 0,
        Voltage = 1,
    }
}

string_enum! {
    pub enum ChargingMethod {
        Direct = 0,
        Pwm = 1,
    }
}

/// A single controller fault, numbered by its bit position in the fault register.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::VariantArray,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum Fault {
    BatteryOverDischarge = 0,
    BatteryOverVoltage = 1,
    BatteryUnderVoltage = 2,
    LoadShortCircuit = 3,
    LoadOverCurrent = 4,
    ControlTemperatureTooHigh = 5,
    AmbientTemperatureTooHigh = 6,
    PhotovoltaicOverPower = 7,
    PhotovoltaicInputShortCircuit = 8,
    PhotovoltaicInputOverVoltage = 9,
    SolarCounterCurrent = 10,
    SolarWorkingPointOverVoltage = 11,
    SolarReverselyConnected = 12,
    AntiReverseMosShortCircuit = 13,
    CircuitChargeMosShortCircuit = 14,
}

impl Fault {
    pub const fn bit(&self) -> u16 {
        1 << *self as u8
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Fault::BatteryOverDischarge => "Battery over discharge",
            Fault::BatteryOverVoltage => "Battery over voltage",
            Fault::BatteryUnderVoltage => "Battery under voltage",
            Fault::LoadShortCircuit => "Load short circuit",
            Fault::LoadOverCurrent => "Load over current",
            Fault::ControlTemperatureTooHigh => "Control temperature too high",
            Fault::AmbientTemperatureTooHigh => "Ambient temperature too high",
            Fault::PhotovoltaicOverPower => "Photovoltaic over power",
            Fault::PhotovoltaicInputShortCircuit => "Photovoltaic input short circuit",
            Fault::PhotovoltaicInputOverVoltage => "Photovoltaic input over voltage",
            Fault::SolarCounterCurrent => "Solar counter current",
            Fault::SolarWorkingPointOverVoltage => "Solar working point over voltage",
            Fault::SolarReverselyConnected => "Solar reversely connected",
            Fault::AntiReverseMosShortCircuit => "Anti-reverse MOS short circuit",
            Fault::CircuitChargeMosShortCircuit => "Circuit charge MOS short circuit",
        }
    }

    /// All faults flagged in the `flags` register, in bit order.
    ///
    /// A zero register means the device has nothing to report. Bit 15 is undefined and ignored.
    pub fn decompose(flags: u16) -> Vec<Fault> {
        if flags == 0 {
            return Vec::new();
        }
        <Fault as strum::VariantArray>::VARIANTS
            .iter()
            .copied()
            .filter(|fault| flags & fault.bit() != 0)
            .collect()
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl serde::Serialize for Fault {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(<&'static str>::from(self))
    }
}

impl TryFrom<Value> for Vec<Fault> {
    type Error = Value;
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Faults(v) => Ok(v),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive as _;
    use proptest::prelude::*;
    use strum::VariantArray as _;

    fn round_trip<T>()
    where
        T: strum::VariantArray + num_traits::ToPrimitive + Copy + PartialEq + std::fmt::Debug,
        T: DecodeFromPattern,
    {
        for variant in T::VARIANTS {
            let pattern = variant.to_u16().unwrap();
            assert_eq!(T::decode_pattern(pattern), Ok(*variant));
        }
    }

    trait DecodeFromPattern: Sized {
        fn decode_pattern(pattern: u16) -> Result<Self, DecodeError>;
    }

    macro_rules! decode_from_pattern {
        ($($name:ident),*) => {
            $(impl DecodeFromPattern for $name {
                fn decode_pattern(pattern: u16) -> Result<Self, DecodeError> {
                    $name::decode("test", pattern, pattern)
                }
            })*
        };
    }

    decode_from_pattern!(
        Toggle,
        ProductType,
        BatteryType,
        ChargingState,
        LoadWorkingMode,
        ChargingModeController,
        ChargingMethod
    );

    #[test]
    fn every_variant_round_trips() {
        round_trip::<Toggle>();
        round_trip::<ProductType>();
        round_trip::<BatteryType>();
        round_trip::<ChargingState>();
        round_trip::<LoadWorkingMode>();
        round_trip::<ChargingModeController>();
        round_trip::<ChargingMethod>();
    }

    #[test]
    fn catalogue_sizes() {
        assert_eq!(Toggle::VARIANTS.len(), 2);
        assert_eq!(ProductType::VARIANTS.len(), 2);
        assert_eq!(BatteryType::VARIANTS.len(), 5);
        assert_eq!(ChargingState::VARIANTS.len(), 7);
        assert_eq!(LoadWorkingMode::VARIANTS.len(), 18);
        assert_eq!(ChargingModeController::VARIANTS.len(), 2);
        assert_eq!(ChargingMethod::VARIANTS.len(), 2);
        assert_eq!(Fault::VARIANTS.len(), 15);
    }

    #[test]
    fn unknown_pattern_is_an_error() {
        assert_eq!(
            BatteryType::decode("battery_type", 0x0000, 0),
            Err(DecodeError::UnknownVariant {
                metric: "battery_type",
                kind: "BatteryType",
                word: 0,
                pattern: 0
            })
        );
        assert!(ChargingState::decode("charging_state", 0xFF07, 7).is_err());
        assert!(LoadWorkingMode::decode("load_working_mode", 0x0012, 0x12).is_err());
    }

    #[test]
    fn names() {
        assert_eq!(LoadWorkingMode::OffAfter12h.to_string(), "off-after-12h");
        assert_eq!(ChargingState::MpptTracking.to_string(), "mppt-tracking");
        assert_eq!("self-customized".parse::<BatteryType>(), Ok(BatteryType::SelfCustomized));
        assert_eq!(<&str>::from(Fault::AntiReverseMosShortCircuit), "anti-reverse-mos-short-circuit");
    }

    #[test]
    fn fault_labels() {
        assert_eq!(Fault::BatteryOverDischarge.to_string(), "Battery over discharge");
        assert_eq!(Fault::AntiReverseMosShortCircuit.label(), "Anti-reverse MOS short circuit");
    }

    #[test]
    fn faults_in_bit_order() {
        assert!(Fault::decompose(0).is_empty());
        assert_eq!(Fault::decompose(0xFFFF), Fault::VARIANTS.to_vec());
        assert_eq!(Fault::decompose(0x7FFF), Fault::VARIANTS.to_vec());
        assert_eq!(
            Fault::decompose(0x2005),
            vec![
                Fault::BatteryOverDischarge,
                Fault::BatteryUnderVoltage,
                Fault::AntiReverseMosShortCircuit
            ]
        );
        assert!(Fault::decompose(0x8000).is_empty());
    }

    #[test]
    fn decimals() {
        assert_eq!(Decimal::new(124, 1).to_string(), "12.4");
        assert_eq!(Decimal::new(3112, 2).to_string(), "31.12");
        assert_eq!(Decimal::new(660, 2).to_string(), "6.60");
        assert_eq!(Decimal::new(123, 4).to_string(), "0.0123");
        assert_eq!(Decimal::new(160, 1).to_string(), "16.0");
        assert_eq!(Decimal::new(42, 0).to_string(), "42");
        assert_eq!(Decimal::new(124, 1).to_f64(), 12.4);
        assert_eq!(Decimal::new(17170947, 3).to_f64(), 17170.947);
        assert_eq!(serde_json::to_string(&Decimal::new(3112, 2)).unwrap(), "31.12");
    }

    proptest! {
        #[test]
        fn single_fault_bit(bit in 0u8..15) {
            let faults = Fault::decompose(1 << bit);
            prop_assert_eq!(faults.len(), 1);
            prop_assert_eq!(faults[0] as u8, bit);
            prop_assert_eq!(Some(faults[0]), Fault::from_repr(bit));
        }

        #[test]
        fn fault_count_matches_popcount(flags in any::<u16>()) {
            let faults = Fault::decompose(flags);
            prop_assert_eq!(faults.len() as u32, (flags & 0x7FFF).count_ones());
            prop_assert!(faults.windows(2).all(|w| (w[0] as u8) < (w[1] as u8)));
        }
    }
}
