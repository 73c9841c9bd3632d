//! Register-level stand-in for a PSU, used by unit tests above the transport layer.

use std::collections::VecDeque;

use crate::{
    error::{Error, Fault, Result},
    mock_serial::MockSerialError,
    transport::Transport,
};

/// Size of the emulated register file. Covers every register the PSU exposes to us.
pub const REGISTER_COUNT: usize = 128;

/// A register file with scripted transient faults.
pub struct MockDevice {
    registers: [u16; REGISTER_COUNT],
    /// Outcome of the next transactions, in order. `None` lets one through.
    faults: VecDeque<Option<Fault>>,
    /// Every transaction fails with a serial error.
    fatal: bool,
    /// Transactions attempted so far, including failed ones.
    calls: usize,
    /// Successful writes in the order they landed.
    writes: Vec<(u16, u16)>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            faults: VecDeque::new(),
            fatal: false,
            calls: 0,
            writes: Vec::new(),
        }
    }

    /// A device answering the identification probe with these four registers.
    pub fn with_identity(model: u16, serial: u32, firmware: u16) -> Self {
        let mut device = Self::new();
        device.set_range(0, &[model, (serial >> 16) as u16, serial as u16, firmware]);
        device
    }

    pub fn set(&mut self, address: u16, value: u16) {
        self.registers[address as usize] = value;
    }

    pub fn set_range(&mut self, start: u16, values: &[u16]) {
        let start = start as usize;
        self.registers[start..start + values.len()].copy_from_slice(values);
    }

    pub fn get(&self, address: u16) -> u16 {
        self.registers[address as usize]
    }

    /// Make the next `count` transactions fail with `fault`.
    pub fn fail_next(&mut self, count: usize, fault: Fault) {
        self.faults.extend(core::iter::repeat_n(Some(fault), count));
    }

    /// Let the next `count` transactions through before any scripted fault.
    pub fn pass_next(&mut self, count: usize) {
        self.faults.extend(core::iter::repeat_n(None, count));
    }

    /// Make every following transaction fail with a non-transient error.
    pub fn fail_fatally(&mut self) {
        self.fatal = true;
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn writes(&self) -> &[(u16, u16)] {
        &self.writes
    }

    fn begin(&mut self) -> Result<(), MockSerialError> {
        self.calls += 1;
        if self.fatal {
            return Err(Error::SerialError(MockSerialError::SimulatedError));
        }
        match self.faults.pop_front().flatten() {
            Some(Fault::NoResponse) => Err(Error::NoResponse),
            Some(Fault::Malformed) => Err(Error::InvalidResponse),
            None => Ok(()),
        }
    }

    fn check_range(address: u16, count: usize) -> Result<usize, MockSerialError> {
        let start = address as usize;
        if start + count > REGISTER_COUNT {
            return Err(Error::ModbusError(rmodbus::ErrorKind::IllegalDataAddress));
        }
        Ok(start)
    }
}

impl Transport for MockDevice {
    type Error = MockSerialError;

    fn read_holdings(&mut self, address: u16, out: &mut [u16]) -> Result<(), MockSerialError> {
        self.begin()?;
        let start = Self::check_range(address, out.len())?;
        out.copy_from_slice(&self.registers[start..start + out.len()]);
        Ok(())
    }

    fn write_holding(&mut self, address: u16, value: u16) -> Result<(), MockSerialError> {
        self.begin()?;
        let start = Self::check_range(address, 1)?;
        self.registers[start] = value;
        self.writes.push((address, value));
        Ok(())
    }

    fn write_holdings(&mut self, address: u16, values: &[u16]) -> Result<(), MockSerialError> {
        self.begin()?;
        let start = Self::check_range(address, values.len())?;
        self.registers[start..start + values.len()].copy_from_slice(values);
        for (offset, value) in values.iter().enumerate() {
            self.writes.push((address + offset as u16, *value));
        }
        Ok(())
    }
}
