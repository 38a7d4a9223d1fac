use tokio_util::bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

/// Largest register count a single read holding registers request may ask for.
pub const MAX_SAFE_READ_COUNT: u16 = 125;

const READ_HOLDINGS: u8 = 0x03;

static MODBUS_CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub device_id: u8,
    pub transaction_id: u16,
    pub operation: Operation,
}

impl Request {
    /// Estimate how many bytes the device will send back for this request.
    ///
    /// Used to extend the read deadline on slow serial links.
    pub fn expected_response_length(&self) -> u16 {
        let bytes_total = match self.operation {
            Operation::GetHoldings { address: _, count } => u32::from(count) * 2,
        };
        // Device id, function code, byte count and CRC.
        let rtu_bytes = bytes_total + 5;
        u16::try_from(rtu_bytes).unwrap_or(u16::MAX)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Operation {
    GetHoldings { address: u16, count: u16 },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub device_id: u8,
    pub transaction_id: u16,
    pub kind: ResponseKind,
}

impl Response {
    pub fn exception_code(&self) -> Option<u8> {
        match &self.kind {
            ResponseKind::ErrorCode(c) => Some(*c),
            ResponseKind::GetHoldings { values: _ } => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResponseKind {
    ErrorCode(u8),
    GetHoldings { values: Vec<u8> },
}

impl ResponseKind {
    /// Register values carried by a successful read, big-endian on the wire.
    pub fn words(&self) -> Option<Vec<u16>> {
        match self {
            ResponseKind::ErrorCode(_) => None,
            ResponseKind::GetHoldings { values } => Some(
                values.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect(),
            ),
        }
    }
}

pub trait Codec:
    for<'a> Encoder<&'a Request, Error = std::io::Error>
    + Decoder<Item = Response, Error = std::io::Error>
{
}

/// Modbus RTU framing as spoken over the RS-232/RS-485 port of the controller.
#[derive(Default)]
pub struct ModbusRTUCodec {
    /// RTU frames carry no transaction id. Remember the last request's so responses can be
    /// matched up the same way as over TCP.
    last_transaction_id: u16,
}

impl Encoder<&Request> for ModbusRTUCodec {
    type Error = std::io::Error;
    fn encode(&mut self, req: &Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        match req.operation {
            Operation::GetHoldings { address, count } => {
                dst.extend(&[req.device_id, READ_HOLDINGS]);
                dst.extend(address.to_be_bytes());
                dst.extend(count.to_be_bytes());
            }
        }
        let crc = MODBUS_CRC.checksum(&dst[start..]);
        dst.extend(crc.to_le_bytes());
        self.last_transaction_id = req.transaction_id;
        trace!(message = "sending encoded", buffer = ?dst);
        Ok(())
    }
}

/// Length of the RTU response frame announced by its first three bytes, if they can start one.
fn rtu_frame_length(function_code: u8, code: u8) -> Option<usize> {
    if function_code & 0x80 != 0 {
        Some(5)
    } else if function_code == READ_HOLDINGS
        && code != 0
        && code % 2 == 0
        && u16::from(code) <= 2 * MAX_SAFE_READ_COUNT
    {
        Some(5 + usize::from(code))
    } else {
        None
    }
}

/// Length of the complete, checksum-valid RTU frame at the start of `buffer`.
fn rtu_valid_frame(buffer: &[u8]) -> Option<usize> {
    let &[_, function_code, code, ..] = buffer else {
        return None;
    };
    let frame_length = rtu_frame_length(function_code, code)?;
    let (body, crc) = buffer.get(..frame_length)?.split_at(frame_length - 2);
    (u16::from_le_bytes([crc[0], crc[1]]) == MODBUS_CRC.checksum(body)).then_some(frame_length)
}

impl Decoder for ModbusRTUCodec {
    type Item = Response;
    type Error = std::io::Error;
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            trace!(message = "attempt at decoding", buffer = ?src);
            let &[device_id, function_code, code, ..] = &src[..] else {
                return Ok(None);
            };
            let Some(frame_length) = rtu_frame_length(function_code, code) else {
                debug!(message = "not a frame header, skipping a byte", function_code, code);
                src.advance(1);
                continue;
            };
            if src.len() < frame_length {
                // Noise can look like the header of a long frame. Prefer a complete frame that is
                // already buffered further in over waiting for bytes that may never come.
                if let Some(offset) = (1..src.len()).find(|&o| rtu_valid_frame(&src[o..]).is_some())
                {
                    debug!(message = "skipping to a later complete frame", offset);
                    src.advance(offset);
                    continue;
                }
                return Ok(None);
            }
            if rtu_valid_frame(src).is_none() {
                debug!(message = "crc mismatch, skipping a byte", device_id, function_code);
                src.advance(1);
                continue;
            }
            let kind = if function_code & 0x80 != 0 {
                ResponseKind::ErrorCode(code)
            } else {
                ResponseKind::GetHoldings { values: src[3..frame_length - 2].to_vec() }
            };
            src.advance(frame_length);
            return Ok(Some(Response {
                device_id,
                transaction_id: self.last_transaction_id,
                kind,
            }));
        }
    }
}

impl Codec for ModbusRTUCodec {}

/// Modbus TCP framing, for controllers reached through a serial-to-ethernet gateway.
#[derive(Default)]
pub struct ModbusTCPCodec {}

impl Encoder<&Request> for ModbusTCPCodec {
    type Error = std::io::Error;
    fn encode(&mut self, req: &Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match req.operation {
            Operation::GetHoldings { address, count } => {
                dst.extend(req.transaction_id.to_be_bytes());
                dst.extend(&[0, 0, 0, 6, req.device_id, READ_HOLDINGS]);
                dst.extend(address.to_be_bytes());
                dst.extend(count.to_be_bytes());
            }
        };
        trace!(message = "sending encoded", buffer = ?dst);
        Ok(())
    }
}

impl Decoder for ModbusTCPCodec {
    type Item = Response;
    type Error = std::io::Error;
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            trace!(message = "attempt at decoding", buffer = ?src);
            if src.len() < 8 {
                return Ok(None);
            }
            let Some((tr_id_buffer, remainder)) = src.split_first_chunk::<2>() else {
                return Ok(None);
            };
            let transaction_id = u16::from_be_bytes(*tr_id_buffer);
            let Some((proto_buffer, remainder)) = remainder.split_first_chunk::<2>() else {
                return Ok(None);
            };
            let proto = u16::from_be_bytes(*proto_buffer);
            if proto != 0 {
                src.advance(1);
                continue;
            }
            let Some((length_buffer, remainder)) = remainder.split_first_chunk::<2>() else {
                return Ok(None);
            };
            let required_length = u16::from_be_bytes(*length_buffer);
            let Some((data, _)) = remainder.split_at_checked(required_length.into()) else {
                return Ok(None);
            };
            let &[device_id, function_code, code, ..] = data else {
                src.advance(1);
                continue;
            };
            let kind = if function_code & 0x80 != 0 {
                ResponseKind::ErrorCode(code)
            } else if function_code == READ_HOLDINGS {
                ResponseKind::GetHoldings { values: data[3..].to_vec() }
            } else {
                src.advance(1);
                continue;
            };
            src.advance(usize::from(required_length) + 6);
            return Ok(Some(Response { transaction_id, device_id, kind }));
        }
    }
}

impl Codec for ModbusTCPCodec {}
