//! This crate provides an interface for communicating with and controlling the Riden RD60xx series of programmable power supplies.
//!
//! PSU models which this should work with:
//! * RD6006
//! * RD6006P
//! * RD6012
//! * RD6018
//!
//! The register scaling differs between models. It is picked from the model register when a
//! session is opened, see [`model::ScaleProfile`].
//!
//! It uses Modbus RTU under the hood, and is suitable for interfacing with the RD PSUs over the USB serial port or the TTL header.
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! The PSU occasionally drops or corrupts a reply, so every transaction goes through
//! [`accessor::RegisterAccessor`], which retries those faults up to a configurable limit.

pub mod accessor;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod psu;
pub mod quantity;
pub mod register;
pub mod report;
pub mod transport;

#[cfg(test)]
mod mock_device;
#[cfg(test)]
mod mock_serial;
