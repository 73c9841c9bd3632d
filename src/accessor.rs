//! Fault-tolerant register access on top of a [`Transport`].
//!
//! Reads are retried on both transient fault kinds. Writes are retried only when the device
//! did not answer: a malformed reply to a write means the write may or may not have landed,
//! so it is handed back to the caller as a fatal error.
//!
//! Retries are bounded by [`RetryPolicy::max_attempts`]. A device that never answers ends in
//! [`Error::RetriesExhausted`] instead of blocking the caller forever.

use fugit::MillisDurationU32;

use crate::{
    error::{Error, Fault, Result},
    transport::Transport,
};

/// Default attempt ceiling per register transaction.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per transaction, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Option<MillisDurationU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            backoff: None,
        }
    }

    pub fn with_backoff(mut self, backoff: MillisDurationU32) -> Self {
        self.backoff = Some(backoff);
        self
    }
}

/// Which transient faults a transaction may be repeated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transaction {
    Read,
    Write,
}

impl Transaction {
    fn retries_on(self, fault: Fault) -> bool {
        match self {
            Transaction::Read => true,
            Transaction::Write => fault == Fault::NoResponse,
        }
    }
}

/// Owns the transport and applies the retry policy to every transaction.
pub struct RegisterAccessor<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RegisterAccessor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Direct access to the transport, bypassing the retry policy.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the underlying transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Read a single register.
    pub fn read_one(&mut self, address: u16) -> Result<u16, T::Error> {
        self.run(Transaction::Read, address, |t| t.read_holding(address))
    }

    /// Read `out.len()` consecutive registers starting at `start`.
    pub fn read_many(&mut self, start: u16, out: &mut [u16]) -> Result<(), T::Error> {
        self.run(Transaction::Read, start, |t| t.read_holdings(start, &mut *out))
    }

    /// Write a single register.
    pub fn write_one(&mut self, address: u16, value: u16) -> Result<(), T::Error> {
        self.run(Transaction::Write, address, |t| t.write_holding(address, value))
    }

    /// Write consecutive registers in one request.
    pub fn write_many(&mut self, start: u16, values: &[u16]) -> Result<(), T::Error> {
        self.run(Transaction::Write, start, |t| t.write_holdings(start, values))
    }

    fn run<R>(
        &mut self,
        kind: Transaction,
        address: u16,
        mut op: impl FnMut(&mut T) -> Result<R, T::Error>,
    ) -> Result<R, T::Error> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match op(&mut self.transport) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let fault = match err.fault() {
                Some(fault) if kind.retries_on(fault) => fault,
                _ => return Err(err),
            };
            if attempt >= max_attempts {
                log::error!(
                    "{kind:?} at register {address} failed {attempt} times, giving up ({fault})"
                );
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: fault,
                });
            }
            log::warn!("{kind:?} at register {address}: {fault}, retry {attempt} of {max_attempts}");
            if let Some(backoff) = self.policy.backoff {
                std::thread::sleep(std::time::Duration::from_millis(backoff.to_millis().into()));
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::MockDevice;

    fn accessor(device: MockDevice) -> RegisterAccessor<MockDevice> {
        RegisterAccessor::new(device, RetryPolicy::default())
    }

    #[test]
    fn read_one_survives_no_response() {
        let mut device = MockDevice::new();
        device.set(14, 2400);
        device.fail_next(3, Fault::NoResponse);

        let mut acc = accessor(device);
        assert_eq!(acc.read_one(14).unwrap(), 2400);
        assert_eq!(acc.into_transport().calls(), 4);
    }

    #[test]
    fn read_one_survives_malformed_response() {
        let mut device = MockDevice::new();
        device.set(14, 2400);
        device.fail_next(2, Fault::Malformed);

        let mut acc = accessor(device);
        assert_eq!(acc.read_one(14).unwrap(), 2400);
    }

    #[test]
    fn read_many_survives_both_fault_kinds() {
        let mut device = MockDevice::new();
        device.set_range(48, &[2024, 5, 17]);
        device.fail_next(1, Fault::NoResponse);
        device.fail_next(1, Fault::Malformed);

        let mut acc = accessor(device);
        let mut regs = [0u16; 3];
        acc.read_many(48, &mut regs).unwrap();
        assert_eq!(regs, [2024, 5, 17]);
        assert_eq!(acc.into_transport().calls(), 3);
    }

    #[test]
    fn write_one_survives_no_response() {
        let mut device = MockDevice::new();
        device.fail_next(5, Fault::NoResponse);

        let mut acc = accessor(device);
        acc.write_one(8, 1200).unwrap();
        let device = acc.into_transport();
        assert_eq!(device.get(8), 1200);
        assert_eq!(device.calls(), 6);
    }

    #[test]
    fn malformed_write_reply_is_not_retried() {
        let mut device = MockDevice::new();
        device.fail_next(1, Fault::Malformed);

        let mut acc = accessor(device);
        let result = acc.write_one(8, 1200);
        assert!(matches!(result, Err(Error::InvalidResponse)));
        assert_eq!(acc.into_transport().calls(), 1);
    }

    #[test]
    fn malformed_bulk_write_reply_is_not_retried() {
        let mut device = MockDevice::new();
        device.fail_next(1, Fault::Malformed);

        let mut acc = accessor(device);
        let result = acc.write_many(80, &[1, 2, 3, 4]);
        assert!(matches!(result, Err(Error::InvalidResponse)));
        assert_eq!(acc.into_transport().calls(), 1);
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let mut device = MockDevice::new();
        device.fail_fatally();

        let mut acc = accessor(device);
        assert!(matches!(acc.read_one(0), Err(Error::SerialError(_))));
        assert_eq!(acc.into_transport().calls(), 1);
    }

    #[test]
    fn retry_ceiling_reports_exhaustion() {
        let mut device = MockDevice::new();
        device.fail_next(100, Fault::NoResponse);

        let mut acc = RegisterAccessor::new(device, RetryPolicy::new(4));
        let result = acc.read_one(10);
        assert!(matches!(
            result,
            Err(Error::RetriesExhausted {
                attempts: 4,
                last: Fault::NoResponse
            })
        ));
        assert_eq!(acc.into_transport().calls(), 4);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut device = MockDevice::new();
        device.set(3, 128);

        let mut acc = RegisterAccessor::new(device, RetryPolicy::new(0));
        assert_eq!(acc.read_one(3).unwrap(), 128);
    }

    #[test]
    fn backoff_is_applied_between_attempts() {
        let mut device = MockDevice::new();
        device.set(3, 128);
        device.fail_next(2, Fault::NoResponse);

        let policy = RetryPolicy::new(3).with_backoff(MillisDurationU32::millis(5));
        let mut acc = RegisterAccessor::new(device, policy);
        let started = std::time::Instant::now();
        assert_eq!(acc.read_one(3).unwrap(), 128);
        assert!(started.elapsed() >= std::time::Duration::from_millis(10));
    }
}
