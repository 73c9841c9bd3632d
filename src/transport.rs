//! Register-level Modbus transport.
//!
//! [`Transport`] is the seam the rest of the crate talks to. [`RtuTransport`] implements it
//! over any [`embedded_io::Read`] + [`embedded_io::Write`] byte stream, leaving frame
//! generation and CRC checks to `rmodbus`.
//!
//! The response timeout is whatever the underlying port enforces. A read that times out
//! before any byte arrives is reported as [`Error::NoResponse`]; a reply that arrives but
//! is truncated, fails its CRC or does not echo the request is [`Error::InvalidResponse`].
//!
//! A reply that turns up after its request timed out would otherwise be read as the answer to
//! the next request, so pending input is discarded before every send and a read never takes
//! more bytes than the frame being waited for.

use crate::{
    config::SessionConfig,
    error::{Error, Result},
};
use embedded_io::Error as _;

/// Most holding registers a single Modbus read may return.
pub const MAX_READ_COUNT: usize = 125;

/// Unit id, function code and byte count, plus two CRC bytes.
const READ_OVERHEAD: usize = 5;
/// Length of the reply to a single or multiple register write.
const WRITE_REPLY_LEN: usize = 8;
/// Smallest frame that can carry an exception code.
const EXCEPTION_LEN: usize = 5;

/// Single and multiple holding register access on one Modbus unit.
pub trait Transport {
    type Error: embedded_io::Error;

    /// Fill `out` with the registers starting at `address`.
    fn read_holdings(&mut self, address: u16, out: &mut [u16]) -> Result<(), Self::Error>;

    /// Write one holding register.
    fn write_holding(&mut self, address: u16, value: u16) -> Result<(), Self::Error>;

    /// Write consecutive holding registers in one request.
    fn write_holdings(&mut self, address: u16, values: &[u16]) -> Result<(), Self::Error>;

    /// Read one holding register.
    fn read_holding(&mut self, address: u16) -> Result<u16, Self::Error> {
        let mut value = [0u16; 1];
        self.read_holdings(address, &mut value)?;
        Ok(value[0])
    }
}

/// Modbus RTU transport over a serial byte stream.
///
/// `L` is the size of the frame buffer. The default fits a full [`MAX_READ_COUNT`] reply.
pub struct RtuTransport<
    S: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
    const L: usize = 256,
> {
    interface: S,
    /// Default for PSU is 0x01.
    unit_id: u8,
}

impl<S, const L: usize> RtuTransport<S, L>
where
    S: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    /// Create a new transport with the given interface and unit ID.
    pub fn new(interface: S, unit_id: u8) -> Self {
        Self { interface, unit_id }
    }

    /// Create a new transport using the unit ID from `config`.
    pub fn from_config(interface: S, config: &SessionConfig) -> Self {
        Self::new(interface, config.unit_id)
    }

    /// Unit ID requests are addressed to.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Give back the underlying interface.
    pub fn into_inner(self) -> S {
        self.interface
    }

    /// Throw away whatever is waiting in the receive buffer.
    fn discard_pending(&mut self) -> Result<(), S::Error> {
        let mut temp_buf = [0u8; 64];
        while self.interface.read_ready().map_err(Error::SerialError)? {
            match self.interface.read(&mut temp_buf) {
                Ok(0) => break,
                Ok(bytes_read) => log::trace!("discarded: {:02X?}", &temp_buf[..bytes_read]),
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), S::Error> {
        self.discard_pending()?;
        log::trace!("tx: {:02X?}", frame);
        self.interface.write_all(frame).map_err(Error::SerialError)
    }

    /// Read until `expected` bytes or an exception frame have arrived.
    fn receive(&mut self, buff: &mut heapless::Vec<u8, L>, expected: usize) -> Result<(), S::Error> {
        let mut temp_buf = [0u8; 8];
        loop {
            // Stop at the end of the frame, anything after it belongs to a later reply.
            let wanted = core::cmp::min(temp_buf.len(), expected.saturating_sub(buff.len()));
            if wanted == 0 {
                break;
            }
            match self.interface.read(&mut temp_buf[..wanted]) {
                Ok(0) => break,
                Ok(bytes_read) => {
                    if buff.extend_from_slice(&temp_buf[..bytes_read]).is_err() {
                        return Err(Error::BufferError);
                    }
                    if buff.len() >= expected || is_exception(buff) {
                        break;
                    }
                }
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
        log::trace!("rx: {:02X?}", buff.as_slice());

        if buff.is_empty() {
            Err(Error::NoResponse)
        } else if buff.len() < expected && !is_exception(buff) {
            Err(Error::InvalidResponse)
        } else {
            Ok(())
        }
    }
}

fn is_exception(frame: &[u8]) -> bool {
    frame.len() >= EXCEPTION_LEN && frame[1] & 0x80 != 0
}

impl<S, const L: usize> Transport for RtuTransport<S, L>
where
    S: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    type Error = S::Error;

    fn read_holdings(&mut self, address: u16, out: &mut [u16]) -> Result<(), S::Error> {
        if out.is_empty() || out.len() > MAX_READ_COUNT {
            return Err(Error::InvalidRange);
        }
        let count = out.len() as u16;

        let mut buff: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_get_holdings(address, count, &mut buff)?;
        self.send(&buff)?;

        // Reuse same buffer when reading back
        buff.clear();
        self.receive(&mut buff, READ_OVERHEAD + 2 * out.len())?;

        let mut parsed: heapless::Vec<u16, MAX_READ_COUNT> = heapless::Vec::new();
        req.parse_u16(&buff, &mut parsed)?;
        if parsed.len() != out.len() {
            return Err(Error::InvalidResponse);
        }
        out.copy_from_slice(&parsed);
        Ok(())
    }

    fn write_holding(&mut self, address: u16, value: u16) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut reply: heapless::Vec<u8, L> = heapless::Vec::new();

        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holding(address, value, &mut request)?;
        self.send(&request)?;

        self.receive(&mut reply, WRITE_REPLY_LEN)?;
        req.parse_ok(&reply)?;
        // A successful single write echoes the request verbatim.
        if request.as_slice() != &reply[..WRITE_REPLY_LEN] {
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }

    fn write_holdings(&mut self, address: u16, values: &[u16]) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut reply: heapless::Vec<u8, L> = heapless::Vec::new();

        let mut req = rmodbus::client::ModbusRequest::new(self.unit_id, rmodbus::ModbusProto::Rtu);
        req.generate_set_holdings_bulk(address, values, &mut request)?;
        self.send(&request)?;

        self.receive(&mut reply, WRITE_REPLY_LEN)?;
        req.parse_ok(&reply)?;
        // Unit id, function, start address and count should match what we sent.
        if request.as_slice()[..6] != reply.as_slice()[..6] {
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }
}
