//! Connection settings for a PSU session.
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! Baud rate and response timeout belong to whoever opens the port. This crate only reads
//! the unit id and the retry policy back out of a [`SessionConfig`].

use fugit::MillisDurationU32;

use crate::accessor::RetryPolicy;

/// Default Modbus unit id of a PSU.
pub const DEFAULT_UNIT_ID: u8 = 0x01;
/// Default PSU baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// The PSU can take a while to respond, half a second covers a full status read.
pub const DEFAULT_RESPONSE_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Modbus unit id (slave address).
    pub unit_id: u8,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Per-request response timeout, applied to the serial port.
    pub response_timeout: MillisDurationU32,
    /// How transient faults are retried.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            unit_id: DEFAULT_UNIT_ID,
            baud_rate: DEFAULT_BAUD_RATE,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_response_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Response timeout as a `std` duration, for handing to a serial port builder.
    pub fn response_timeout_std(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.response_timeout.to_millis().into())
    }
}
