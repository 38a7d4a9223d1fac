use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use renogy_rover_tools::connection::{Connection, Error, Timing};
use renogy_rover_tools::controller::RoverController;
use renogy_rover_tools::modbus::{ModbusRTUCodec, ModbusTCPCodec};
use renogy_rover_tools::source::RegisterSource;
use renogy_rover_tools::values::BatteryType;

/// A byte stream which hands out canned responses, optionally in small pieces, and remembers
/// everything written to it.
///
/// A quiet wire reads as a closed stream, unless it is `scripted`. Then it times out like a
/// serial port would, and each flushed request releases the next scripted reply, if any.
#[derive(Clone, Default)]
struct Wire {
    incoming: Arc<Mutex<VecDeque<u8>>>,
    written: Arc<Mutex<Vec<u8>>>,
    piece: usize,
    replies: Option<Arc<Mutex<VecDeque<Option<Vec<u8>>>>>>,
}

impl Wire {
    fn with_responses(frames: &[&[u8]]) -> Self {
        let wire = Wire { piece: 3, ..Default::default() };
        wire.incoming.lock().unwrap().extend(frames.iter().flat_map(|f| f.iter().copied()));
        wire
    }

    fn scripted(replies: Vec<Option<Vec<u8>>>) -> Self {
        let replies = Some(Arc::new(Mutex::new(replies.into())));
        Wire { piece: 3, replies, ..Default::default() }
    }

    fn arrive(&self, bytes: &[u8]) {
        self.incoming.lock().unwrap().extend(bytes);
    }

    fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }
}

impl Read for Wire {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut incoming = self.incoming.lock().unwrap();
        if incoming.is_empty() && self.replies.is_some() {
            return Err(std::io::ErrorKind::TimedOut.into());
        }
        let n = buf.len().min(self.piece.max(1)).min(incoming.len());
        for (slot, byte) in buf.iter_mut().zip(incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(replies) = &self.replies {
            if let Some(Some(reply)) = replies.lock().unwrap().pop_front() {
                self.arrive(&reply);
            }
        }
        Ok(())
    }
}

const TIMING: Timing = Timing { read_timeout: Duration::from_secs(1), baudrate: 9600 };

#[test]
fn rtu_single_register() {
    let wire = Wire::with_responses(&[&[0x01, 0x03, 0x02, 0x00, 0x7C, 0xB9, 0xA5]]);
    let mut connection = Connection::new(wire.clone(), ModbusRTUCodec::default(), 1, TIMING);
    assert_eq!(connection.read_u16(0x0100).unwrap(), 124);
    assert_eq!(wire.written(), [0x01, 0x03, 0x01, 0x00, 0x00, 0x01, 0x85, 0xF6]);
}

#[test]
fn rtu_register_pair_after_line_noise() {
    let wire = Wire::with_responses(&[
        &[0xFF, 0x00],
        &[0x01, 0x03, 0x04, 0x12, 0x34, 0x56, 0x78, 0x81, 0x07],
    ]);
    let mut connection = Connection::new(wire.clone(), ModbusRTUCodec::default(), 1, TIMING);
    assert_eq!(connection.read_u16_seq(0x0018, 2).unwrap(), [0x1234, 0x5678]);
    assert_eq!(wire.written(), [0x01, 0x03, 0x00, 0x18, 0x00, 0x02, 0x44, 0x0C]);
}

#[test]
fn rtu_exception() {
    let wire = Wire::with_responses(&[&[0x01, 0x83, 0x02, 0xC0, 0xF1]]);
    let mut connection = Connection::new(wire, ModbusRTUCodec::default(), 1, TIMING);
    assert!(matches!(connection.read_u16(0x0100), Err(Error::Exception(2))));
    assert!(connection.is_connected());
}

#[test]
fn closed_stream() {
    let mut connection = Connection::new(Wire::default(), ModbusRTUCodec::default(), 1, TIMING);
    assert!(matches!(connection.read_u16(0x0100), Err(Error::Closed)));
    assert!(!connection.is_connected());
    assert!(RoverController::new(connection).is_err());
}

#[test]
fn rtu_late_response_is_not_taken_for_the_next() {
    let timing = Timing { read_timeout: Duration::from_millis(50), baudrate: 9600 };
    let wire = Wire::scripted(vec![None, Some(vec![0x01, 0x03, 0x02, 0x01, 0xCC, 0xB9, 0x81])]);
    let mut connection = Connection::new(wire.clone(), ModbusRTUCodec::default(), 1, timing);
    assert!(matches!(connection.read_u16(0x0101), Err(Error::Timeout(_))));
    assert!(connection.is_connected());

    // The answer to the first request shows up only after it was given up on.
    wire.arrive(&[0x01, 0x03, 0x02, 0x00, 0x7C, 0xB9, 0xA5]);
    assert_eq!(connection.read_u16(0x0106).unwrap(), 460);
    assert_eq!(
        wire.written(),
        [
            0x01, 0x03, 0x01, 0x01, 0x00, 0x01, 0xD4, 0x36, //
            0x01, 0x03, 0x01, 0x06, 0x00, 0x01, 0x65, 0xF7,
        ]
    );
}

#[test]
fn fresh_connection_is_connected() {
    let connection = Connection::new(Wire::default(), ModbusRTUCodec::default(), 1, TIMING);
    assert!(connection.is_connected());
}

#[test]
fn controller_over_rtu() {
    let wire = Wire::with_responses(&[&[0x10, 0x03, 0x02, 0x00, 0x02, 0xC5, 0x86]]);
    let connection = Connection::new(wire.clone(), ModbusRTUCodec::default(), 0x10, TIMING);
    let mut controller = RoverController::new(connection).unwrap();
    assert_eq!(controller.battery_type().unwrap(), BatteryType::Sealed);
    assert_eq!(wire.written(), [0x10, 0x03, 0xE0, 0x04, 0x00, 0x01, 0xF1, 0x4A]);
}

#[test]
fn tcp_ignores_other_transactions() {
    let wire = Wire::with_responses(&[
        &[0x00, 0x09, 0, 0, 0, 5, 1, 3, 2, 0x00, 0x01],
        &[0x00, 0x00, 0, 0, 0, 5, 1, 3, 2, 0xBE, 0x02],
    ]);
    let mut connection = Connection::new(wire.clone(), ModbusTCPCodec::default(), 1, TIMING);
    assert_eq!(connection.read_u16(0x0120).unwrap(), 0xBE02);
    assert_eq!(wire.written(), [0, 0, 0, 0, 0, 6, 1, 3, 0x01, 0x20, 0, 1]);
}

#[test]
fn tcp_wrong_register_count() {
    let wire = Wire::with_responses(&[&[0x00, 0x00, 0, 0, 0, 5, 1, 3, 2, 0x00, 0x01]]);
    let mut connection = Connection::new(wire, ModbusTCPCodec::default(), 1, TIMING);
    assert!(matches!(
        connection.read_u16_seq(0x0118, 2),
        Err(Error::ResponseLength { expected: 2, got: 1 })
    ));
}
