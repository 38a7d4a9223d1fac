//! Typed access to the metrics of a Rover charge controller.
//!
//! Every accessor issues a fresh read for exactly the registers its metric covers and decodes
//! the result. Nothing is cached: the device state changes between calls.

use crate::registers::{Metric, Raw, Value, Width, for_each_metric};
use crate::source::RegisterSource;
use crate::values::{
    BatteryType, ChargingMethod, ChargingModeController, ChargingState, Decimal, DecodeError,
    Fault, LoadWorkingMode, ProductType, Toggle,
};
use tracing::{debug, trace};

#[derive(thiserror::Error, Debug)]
pub enum Error<E> {
    #[error("the register source has no usable channel")]
    NotConnected,
    #[error(transparent)]
    Transport(E),
    #[error("could not decode the register value")]
    Decode(#[from] DecodeError),
}

pub struct RoverController<S> {
    source: S,
}

impl<S: RegisterSource> RoverController<S> {
    pub fn new(source: S) -> Result<Self, Error<S::Error>> {
        if !source.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(Self { source })
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read and decode any metric from the catalogue.
    pub fn read(&mut self, metric: &Metric) -> Result<Value, Error<S::Error>> {
        let address = metric.address;
        let raw = match metric.data_type.width() {
            Width::Word => Raw::Word(self.source.read_u16(address).map_err(Error::Transport)?),
            Width::Words(count) => {
                Raw::Words(self.source.read_u16_seq(address, count).map_err(Error::Transport)?)
            }
            Width::Text(chars) => {
                Raw::Text(self.source.read_text(address, chars).map_err(Error::Transport)?)
            }
        };
        trace!(message = "read", metric = metric.name, address, ?raw);
        metric.decode(raw).map_err(|e| {
            debug!(
                message = "decoding failed",
                metric = metric.name,
                error = (&e as &dyn std::error::Error)
            );
            Error::Decode(e)
        })
    }
}

macro_rules! make_accessors {
    ($($addr:literal: $dt:ident, $konst:ident, $accessor:ident -> $ty:ty, $unit:literal, $desc:literal;)+) => {
        impl<S: RegisterSource> RoverController<S> {
            $(
                #[doc = concat!($desc, " (register `", stringify!($addr), "`).")]
                pub fn $accessor(&mut self) -> Result<$ty, Error<S::Error>> {
                    let value = self.read(&Metric::$konst)?;
                    <$ty>::try_from(value).map_err(|value| {
                        Error::Decode(DecodeError::Mismatch {
                            metric: Metric::$konst.name,
                            found: value.kind(),
                        })
                    })
                }
            )+
        }
    };
}

for_each_metric!(make_accessors);
