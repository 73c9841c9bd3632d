//! Device identification and scaling factors for different PSU models.
//!
//! The PSU reports its model in register 0. Everything that converts a raw register to volts
//! or amps needs to know which of the two scale profiles the model uses, so the profile is
//! resolved once when a session is opened and never re-derived afterwards.

use crate::{
    accessor::RegisterAccessor,
    error::Result,
    register::RdRegister,
    transport::Transport,
};

/// Model codes of the high-current supplies, which report current in centi-amps.
pub const HIGH_POWER_MODELS: [u16; 2] = [6012, 6018];

/// Registers read by the identification probe.
pub const IDENTITY_REGISTERS: usize = 4;

/// Identity read from the first four registers of the PSU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Raw model register, e.g. `60062`.
    pub model_raw: u16,
    pub serial_number: u32,
    /// Raw firmware register, in hundredths.
    pub firmware_raw: u16,
}

impl DeviceIdentity {
    /// Build the identity from registers 0 - 3.
    pub fn from_registers(regs: &[u16; IDENTITY_REGISTERS]) -> Self {
        DeviceIdentity {
            model_raw: regs[0],
            serial_number: combine_words(regs[1], regs[2]),
            firmware_raw: regs[3],
        }
    }

    /// Model code used to pick the scale profile, e.g. `6006`.
    pub fn model_code(&self) -> u16 {
        self.model_raw / 10
    }

    /// Model number as shown to users, e.g. `6006.2`.
    pub fn model_display(&self) -> f64 {
        f64::from(self.model_raw) / 10.0
    }

    /// Firmware version, e.g. `1.28`.
    pub fn firmware_version(&self) -> f64 {
        f64::from(self.firmware_raw) / 100.0
    }

    pub fn scale_profile(&self) -> ScaleProfile {
        ScaleProfile::from_model_code(self.model_code())
    }
}

/// Combine two registers into a 32-bit value. The high word always comes first.
pub const fn combine_words(high: u16, low: u16) -> u32 {
    ((high as u32) << 16) | low as u32
}

/// Divisors from raw register values to volts and amps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactors {
    pub voltage: u16,
    pub current: u16,
}

/// The two scaling schemes used across the RD60xx range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleProfile {
    /// Centi-volts and milli-amps.
    Standard,
    /// Centi-volts and centi-amps (RD6012, RD6018).
    HighPower,
}

impl ScaleProfile {
    pub fn from_model_code(model_code: u16) -> Self {
        if HIGH_POWER_MODELS.contains(&model_code) {
            ScaleProfile::HighPower
        } else {
            ScaleProfile::Standard
        }
    }

    pub const fn factors(&self) -> ScaleFactors {
        match self {
            ScaleProfile::Standard => ScaleFactors {
                voltage: 100,
                current: 1000,
            },
            ScaleProfile::HighPower => ScaleFactors {
                voltage: 100,
                current: 100,
            },
        }
    }
}

/// Read the identification registers from the PSU.
pub fn identify<T: Transport>(accessor: &mut RegisterAccessor<T>) -> Result<DeviceIdentity, T::Error> {
    let mut regs = [0u16; IDENTITY_REGISTERS];
    accessor.read_many(RdRegister::Model.into(), &mut regs)?;
    let identity = DeviceIdentity::from_registers(&regs);
    log::debug!(
        "identified RD{} SN:{:08} FW:{} ({:?} scaling)",
        identity.model_code(),
        identity.serial_number,
        identity.firmware_version(),
        identity.scale_profile()
    );
    Ok(identity)
}
