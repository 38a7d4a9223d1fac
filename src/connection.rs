use crate::modbus::{
    self, Codec, MAX_SAFE_READ_COUNT, ModbusRTUCodec, ModbusTCPCodec, Request, ResponseKind,
};
use crate::source::RegisterSource;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs as _};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::bytes::BytesMut;
use tracing::{debug, info, trace};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the serial device at {1:?}")]
    OpenSerial(#[source] serialport::Error, PathBuf),
    #[error("lookup of `{1}` failed")]
    LookupHost(#[source] std::io::Error, String),
    #[error("could not connect to `{1}` over TCP")]
    Connect(#[source] std::io::Error, String),
    #[error("could not configure the TCP socket")]
    Configure(#[source] std::io::Error),
    #[error("could not send out the request")]
    Send(#[source] std::io::Error),
    #[error("could not read data from the stream")]
    Receive(#[source] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("the device closed the connection")]
    Closed,
    #[error("the device responded with modbus exception code {0}")]
    Exception(u8),
    #[error("the device returned {got} registers instead of {expected}")]
    ResponseLength { expected: u16, got: usize },
}

#[derive(clap::Parser, Clone)]
#[group(id = "connection::Args")]
pub struct Args {
    #[clap(flatten)]
    how: ConnectionGroup,

    /// The modbus device ID of the charge controller.
    #[arg(long, short = 'i', default_value = "1")]
    device_id: u8,

    /// If the modbus response isn't received in this amount of time plus the expected transfer
    /// time at the configured baudrate, consider the request failed.
    #[arg(long, default_value = "1s")]
    read_timeout: humantime::Duration,

    /// The baudrate of the controller's RS-232 port.
    ///
    /// Used to open the serial device and to pace the response deadline.
    #[arg(long, default_value = "9600")]
    baudrate: u32,
}

#[derive(clap::Parser, Clone)]
#[group(required = true)]
pub struct ConnectionGroup {
    /// Connect to the controller over a Modbus TCP gateway (`host:port`).
    #[arg(long)]
    tcp: Option<String>,
    /// Connect to the controller over Serial Modbus RTU.
    ///
    /// Specify the path to the serial device.
    #[arg(long)]
    rtu: Option<PathBuf>,
}

impl Args {
    pub fn connect(&self) -> Result<Box<dyn RegisterSource<Error = Error>>, Error> {
        let timing = Timing { read_timeout: *self.read_timeout, baudrate: self.baudrate };
        if let Some(path) = &self.how.rtu {
            info!(message = "opening serial device", ?path, baudrate = self.baudrate);
            let port = serialport::new(path.to_string_lossy(), self.baudrate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .timeout(timing.read_timeout)
                .open()
                .map_err(|e| Error::OpenSerial(e, path.clone()))?;
            info!(message = "opened");
            let codec = ModbusRTUCodec::default();
            Ok(Box::new(Connection::new(port, codec, self.device_id, timing)))
        } else if let Some(address) = &self.how.tcp {
            info!(message = "connecting...", address);
            let addresses = address
                .to_socket_addrs()
                .map_err(|e| Error::LookupHost(e, address.clone()))?
                .collect::<Vec<_>>();
            debug!(message = "resolved", ?addresses);
            let socket = TcpStream::connect(&*addresses)
                .map_err(|e| Error::Connect(e, address.clone()))?;
            socket.set_read_timeout(Some(timing.read_timeout)).map_err(Error::Configure)?;
            let nodelay_result = socket.set_nodelay(true);
            trace!(message = "setting nodelay", is_error = ?nodelay_result.err());
            info!(message = "connected");
            let codec = ModbusTCPCodec::default();
            Ok(Box::new(Connection::new(socket, codec, self.device_id, timing)))
        } else {
            unreachable!("clap requires one of `--tcp` and `--rtu`")
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub read_timeout: Duration,
    pub baudrate: u32,
}

impl Timing {
    /// How long to wait for a response of `response_length` bytes.
    pub fn deadline(&self, response_length: u16) -> Duration {
        // 8N1 puts 10 bits on the wire for every byte.
        let bytes_per_second = (self.baudrate / 10).max(1);
        Duration::from_secs(response_length.into()) / bytes_per_second + self.read_timeout
    }
}

pub trait Transport: Read + Write + Send {}
impl<T: Read + Write + Send> Transport for T {}

/// A blocking request-response loop over a byte stream.
///
/// Exactly one request is outstanding at any time. Failures are reported to the caller as is;
/// nothing is retried.
pub struct Connection<C> {
    io: Box<dyn Transport>,
    codec: C,
    buffer: BytesMut,
    device_id: u8,
    timing: Timing,
    next_transaction_id: u16,
    closed: bool,
    /// A request failed while its response may still be on the way.
    stale: bool,
}

impl<C: Codec + Send> Connection<C> {
    pub fn new(io: impl Transport + 'static, codec: C, device_id: u8, timing: Timing) -> Self {
        Self {
            io: Box::new(io),
            codec,
            buffer: BytesMut::with_capacity(256),
            device_id,
            timing,
            next_transaction_id: 0,
            closed: false,
            stale: false,
        }
    }

    fn new_transaction_id(&mut self) -> u16 {
        let id = self.next_transaction_id;
        self.next_transaction_id = id.wrapping_add(1);
        id
    }

    fn get_holdings(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        let transaction_id = self.new_transaction_id();
        let operation = modbus::Operation::GetHoldings { address, count };
        let request = Request { device_id: self.device_id, transaction_id, operation };

        // Anything left over belongs to an earlier request that has already failed.
        if !self.buffer.is_empty() {
            debug!(message = "discarding stale bytes", buffer = ?self.buffer);
            self.buffer.clear();
        }
        if self.stale {
            self.drain()?;
        }
        let mut frame = BytesMut::new();
        self.codec.encode(&request, &mut frame).map_err(Error::Send)?;
        self.io.write_all(&frame).map_err(Error::Send)?;
        self.io.flush().map_err(Error::Send)?;

        let timeout = self.timing.deadline(request.expected_response_length());
        let deadline = Instant::now() + timeout;
        let mut chunk = [0; 256];
        loop {
            while let Some(response) = self.codec.decode(&mut self.buffer).map_err(Error::Receive)? {
                trace!(message = "decoded a response", transaction = response.transaction_id);
                if response.transaction_id != transaction_id || response.device_id != self.device_id
                {
                    debug!(
                        message = "a response we were not expecting",
                        transaction = response.transaction_id,
                        device_id = response.device_id,
                    );
                    continue;
                }
                let words = match response.kind {
                    ResponseKind::ErrorCode(code) => return Err(Error::Exception(code)),
                    kind @ ResponseKind::GetHoldings { .. } => kind.words().unwrap_or_default(),
                };
                if words.len() != usize::from(count) {
                    return Err(Error::ResponseLength { expected: count, got: words.len() });
                }
                return Ok(words);
            }
            if Instant::now() >= deadline {
                self.stale = true;
                return Err(Error::Timeout(timeout));
            }
            match self.io.read(&mut chunk) {
                Ok(0) => {
                    info!(message = "stream closed");
                    self.closed = true;
                    return Err(Error::Closed);
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    self.stale = true;
                    return Err(Error::Receive(e));
                }
            }
        }
    }

    /// Discard whatever arrives until the stream goes quiet.
    ///
    /// RTU frames carry no transaction id, so a response that shows up after its request timed
    /// out would otherwise be taken as the answer to the next request.
    fn drain(&mut self) -> Result<(), Error> {
        let deadline = Instant::now() + self.timing.read_timeout;
        let mut chunk = [0; 256];
        loop {
            match self.io.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    debug!(message = "discarding a late response", bytes = ?&chunk[..n]);
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) => return Err(Error::Receive(e)),
            }
        }
        self.stale = false;
        Ok(())
    }
}

impl<C: Codec + Send> RegisterSource for Connection<C> {
    type Error = Error;

    /// Only a stream seen closed by a read counts as disconnected, so a freshly opened
    /// connection always reports `true`. Whether the device answers is up to the first read.
    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn read_u16(&mut self, address: u16) -> Result<u16, Error> {
        let words = self.get_holdings(address, 1)?;
        Ok(words[0])
    }

    fn read_u16_seq(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        let mut words = Vec::with_capacity(count.into());
        let mut offset = 0;
        while offset < count {
            let chunk = (count - offset).min(MAX_SAFE_READ_COUNT);
            words.extend(self.get_holdings(address.wrapping_add(offset), chunk)?);
            offset += chunk;
        }
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_accounts_for_transfer_time() {
        let timing = Timing { read_timeout: Duration::from_secs(1), baudrate: 9600 };
        assert_eq!(timing.deadline(960), Duration::from_secs(2));
        let timing = Timing { read_timeout: Duration::ZERO, baudrate: 5 };
        assert_eq!(timing.deadline(2), Duration::from_secs(2));
    }
}
