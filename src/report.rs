//! Composite reads built from several registers: the full status snapshot and the clock.

use crate::{
    error::Result,
    memory::{MemoryPreset, MemorySlot, SLOT_SIZE},
    model::{DeviceIdentity, IDENTITY_REGISTERS, ScaleFactors},
    psu::RdPsu,
    quantity::{Quantity, to_physical},
    register::{ControlMode, ProtectionStatus, RdRegister, State},
    transport::Transport,
};

/// Registers covered by the status snapshot, 0 through the last register of M9.
pub const STATUS_WINDOW: usize =
    (RdRegister::MemoryBase as u16 + MemorySlot::ALL.len() as u16 * SLOT_SIZE) as usize;

/// Date as kept by the PSU clock. Not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceDate {
    pub year: u16,
    pub month: u16,
    pub day: u16,
}

/// Time of day as kept by the PSU clock. Not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceTime {
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    pub active: bool,
    /// Raw register value.
    pub voltage: f64,
    /// Amp-hours.
    pub capacity: f64,
    /// Watt-hours.
    pub energy: f64,
}

/// Temperatures in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperatures {
    pub internal_c: i64,
    pub internal_f: i64,
    pub external_c: i64,
    pub external_f: i64,
}

/// Everything the PSU reports, decoded from one read.
#[derive(Debug, Clone, PartialEq)]
pub struct FullStatus {
    pub identity: DeviceIdentity,
    pub input_voltage: f64,
    pub temperatures: Temperatures,
    pub output_voltage: f64,
    pub output_current: f64,
    pub output_charge: f64,
    pub output_power: f64,
    pub set_voltage: f64,
    pub set_current: f64,
    pub over_voltage_protection: f64,
    pub over_current_protection: f64,
    pub protection: ProtectionStatus,
    pub control_mode: ControlMode,
    pub output: State,
    pub backlight: u16,
    pub battery: BatteryStatus,
    pub date: DeviceDate,
    pub time: DeviceTime,
    pub memories: [MemoryPreset; MemorySlot::ALL.len()],
}

impl FullStatus {
    /// Decode a snapshot of registers `0..STATUS_WINDOW`.
    pub fn from_registers(regs: &[u16; STATUS_WINDOW], factors: ScaleFactors) -> Self {
        // Every quantity lies inside the window, so decoding cannot come up short.
        let raw = |q: Quantity| q.spec().decode_raw(regs, 0).unwrap_or_default();
        let value = |q: Quantity| to_physical(raw(q), q.spec().scale.divisor(factors));
        let at = |r: RdRegister| regs[r as usize];

        let identity = DeviceIdentity::from_registers(&core::array::from_fn::<_, IDENTITY_REGISTERS, _>(
            |i| regs[i],
        ));
        let memories = MemorySlot::ALL.map(|slot| {
            let base = usize::from(slot.base_address());
            MemoryPreset::from_registers(&core::array::from_fn(|i| regs[base + i]), factors)
        });

        FullStatus {
            identity,
            input_voltage: value(Quantity::InputVoltage),
            temperatures: Temperatures {
                internal_c: raw(Quantity::InternalTemperature),
                internal_f: raw(Quantity::InternalTemperatureFahrenheit),
                external_c: raw(Quantity::ExternalTemperature),
                external_f: raw(Quantity::ExternalTemperatureFahrenheit),
            },
            output_voltage: value(Quantity::OutputVoltage),
            output_current: value(Quantity::OutputCurrent),
            output_charge: value(Quantity::OutputCharge),
            output_power: value(Quantity::OutputPower),
            set_voltage: value(Quantity::SetVoltage),
            set_current: value(Quantity::SetCurrent),
            over_voltage_protection: value(Quantity::OverVoltageProtection),
            over_current_protection: value(Quantity::OverCurrentProtection),
            protection: ProtectionStatus::from(at(RdRegister::Protect)),
            control_mode: ControlMode::from(at(RdRegister::CvCc)),
            output: State::from(at(RdRegister::OnOff) != 0),
            backlight: at(RdRegister::Backlight),
            battery: BatteryStatus {
                active: raw(Quantity::BatteryActive) != 0,
                voltage: value(Quantity::BatteryVoltage),
                capacity: value(Quantity::BatteryCapacity),
                energy: value(Quantity::BatteryEnergy),
            },
            date: DeviceDate {
                year: at(RdRegister::Year),
                month: at(RdRegister::Month),
                day: at(RdRegister::Day),
            },
            time: DeviceTime {
                hour: at(RdRegister::Hour),
                minute: at(RdRegister::Minute),
                second: at(RdRegister::Second),
            },
            memories,
        }
    }
}

impl<T: Transport> RdPsu<T> {
    /// Read the full status of the PSU in a single request.
    ///
    /// The window runs to the end of the memory bank so that every slot comes from the same
    /// snapshot as the live values.
    pub fn read_status(&mut self) -> Result<FullStatus, T::Error> {
        let mut regs = [0u16; STATUS_WINDOW];
        self.accessor().read_many(0, &mut regs)?;
        let status = FullStatus::from_registers(&regs, self.scale_factors());
        log::debug!("status: {:?}", status);
        Ok(status)
    }

    /// Returns the date from the PSU clock.
    pub fn read_date(&mut self) -> Result<DeviceDate, T::Error> {
        let mut regs = [0u16; 3];
        self.accessor().read_many(RdRegister::Year.into(), &mut regs)?;
        Ok(DeviceDate {
            year: regs[0],
            month: regs[1],
            day: regs[2],
        })
    }

    /// Sets the date on the PSU clock.
    ///
    /// The three registers are written one at a time. If a later write fails the earlier ones
    /// stay applied.
    pub fn write_date(&mut self, date: DeviceDate) -> Result<(), T::Error> {
        self.write_fields(
            "date",
            [
                (RdRegister::Year, date.year),
                (RdRegister::Month, date.month),
                (RdRegister::Day, date.day),
            ],
        )
    }

    /// Returns the time of day from the PSU clock.
    pub fn read_time(&mut self) -> Result<DeviceTime, T::Error> {
        let mut regs = [0u16; 3];
        self.accessor().read_many(RdRegister::Hour.into(), &mut regs)?;
        Ok(DeviceTime {
            hour: regs[0],
            minute: regs[1],
            second: regs[2],
        })
    }

    /// Sets the time of day on the PSU clock.
    ///
    /// Same partial-write behaviour as [`Self::write_date`].
    pub fn write_time(&mut self, time: DeviceTime) -> Result<(), T::Error> {
        self.write_fields(
            "time",
            [
                (RdRegister::Hour, time.hour),
                (RdRegister::Minute, time.minute),
                (RdRegister::Second, time.second),
            ],
        )
    }

    fn write_fields(&mut self, what: &str, fields: [(RdRegister, u16); 3]) -> Result<(), T::Error> {
        for (written, (register, value)) in fields.into_iter().enumerate() {
            if let Err(err) = self.accessor().write_one(register.into(), value) {
                if written > 0 {
                    log::warn!("{what} partially written: {written} of 3 registers applied");
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
