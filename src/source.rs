//! The capability the decoder consumes: reading raw registers off a device.
//!
//! Implementations own the transport. They are expected to serialize access to the bus
//! themselves (hence `&mut self`) and to enforce whatever timeout budget makes sense for the
//! medium. Errors are returned to the caller untouched by the decoder.

use crate::decode;

pub trait RegisterSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the underlying channel is usable at all.
    ///
    /// Checked once when a [`RoverController`](crate::controller::RoverController) is
    /// constructed.
    fn is_connected(&self) -> bool {
        true
    }

    fn read_u16(&mut self, address: u16) -> Result<u16, Self::Error>;

    /// Read `count` consecutive registers starting at `address`.
    ///
    /// The returned vector must contain exactly `count` words in address order.
    fn read_u16_seq(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Self::Error>;

    /// Read a fixed-length string of `char_count` characters starting at `address`.
    ///
    /// Each register holds two characters, high byte first. Sources which receive text already
    /// assembled may override this.
    fn read_text(&mut self, address: u16, char_count: u16) -> Result<String, Self::Error> {
        let words = self.read_u16_seq(address, char_count.div_ceil(2))?;
        Ok(decode::text(&words))
    }
}

impl<S: RegisterSource + ?Sized> RegisterSource for Box<S> {
    type Error = S::Error;

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn read_u16(&mut self, address: u16) -> Result<u16, Self::Error> {
        (**self).read_u16(address)
    }

    fn read_u16_seq(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Self::Error> {
        (**self).read_u16_seq(address, count)
    }

    fn read_text(&mut self, address: u16, char_count: u16) -> Result<String, Self::Error> {
        (**self).read_text(address, char_count)
    }
}
