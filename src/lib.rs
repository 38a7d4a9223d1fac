//! Reading and decoding the Modbus register map of Renogy Rover solar charge controllers.
//!
//! [`source::RegisterSource`] is the only thing the decoder needs from a device.
//! [`controller::RoverController`] turns raw registers into typed readings using the metric
//! catalogue in [`registers`]. [`connection`] provides a serial and TCP implementation of the
//! source for the command line tool.

pub mod commands;
pub mod connection;
pub mod controller;
pub mod decode;
pub mod modbus;
pub mod output;
pub mod registers;
pub mod source;
pub mod values;
