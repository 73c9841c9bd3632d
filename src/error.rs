//! Our error types for the RD60xx PSUs.

use strum_macros::Display;
use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for Riden RD60xx PSU communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Modbus protocol error: {0}")]
    ModbusError(rmodbus::ErrorKind),
    #[error("No response from device")]
    NoResponse,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Response does not fit the frame buffer")]
    BufferError,
    #[error("Invalid range")]
    InvalidRange,
    #[error("Register {0} is read-only")]
    ReadOnly(u16),
    #[error("Gave up after {attempts} attempts, last fault: {last}")]
    RetriesExhausted { attempts: u32, last: Fault },
}

/// The two kinds of transient fault a transaction may be retried on.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Nothing came back before the port timed out.
    #[strum(serialize = "no response")]
    NoResponse,
    /// Bytes came back but did not form a valid reply.
    #[strum(serialize = "malformed response")]
    Malformed,
}

impl<I: embedded_io::Error> Error<I> {
    /// Classify this error as a transient fault, or `None` if it is fatal.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Error::NoResponse => Some(Fault::NoResponse),
            Error::InvalidResponse => Some(Fault::Malformed),
            _ => None,
        }
    }
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Error<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        match err {
            // A damaged frame is a transmission problem, not a device answer.
            rmodbus::ErrorKind::FrameBroken | rmodbus::ErrorKind::FrameCRCError => {
                Error::InvalidResponse
            }
            other => Error::ModbusError(other),
        }
    }
}
