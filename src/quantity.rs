//! The table of physical quantities the PSU exposes, and the conversions between raw
//! register values and physical units.
//!
//! Every quantity is described by a [`RegisterSpec`]. Reading a quantity always fetches the
//! whole window a [`RegisterSpec`] covers (sign and magnitude, or high and low word) in one request, and
//! the same decoding is used for live reads and for status snapshots.

use strum_macros::{EnumIter, IntoStaticStr};

use crate::{
    model::{ScaleFactors, combine_words},
    register::RdRegister as R,
};

/// Every quantity the driver knows how to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum Quantity {
    /// Output voltage setting, volts.
    SetVoltage,
    /// Output current limit, amps.
    SetCurrent,
    /// Measured output voltage, volts.
    OutputVoltage,
    /// Measured output current, amps.
    OutputCurrent,
    /// Charge delivered since the output was enabled, amp-hours.
    OutputCharge,
    /// Measured output power, watts.
    OutputPower,
    /// Supply input voltage, volts.
    InputVoltage,
    /// Internal temperature, °C.
    InternalTemperature,
    /// Internal temperature, °F.
    InternalTemperatureFahrenheit,
    /// External probe temperature, °C.
    ExternalTemperature,
    /// External probe temperature, °F.
    ExternalTemperatureFahrenheit,
    /// Protection status, see [`crate::register::ProtectionStatus`].
    ProtectionStatus,
    /// CV/CC mode, see [`crate::register::ControlMode`].
    ControlMode,
    /// Output switch, 0 or 1.
    OutputEnable,
    /// Backlight level 0 - 5.
    Backlight,
    /// Over-voltage protection level, volts.
    OverVoltageProtection,
    /// Over-current protection level, amps.
    OverCurrentProtection,
    /// Battery mode flag.
    BatteryActive,
    /// Battery voltage, raw register value.
    BatteryVoltage,
    /// Battery charge counter, amp-hours.
    BatteryCapacity,
    /// Battery energy counter, watt-hours.
    BatteryEnergy,
}

/// Number of registers a quantity spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Single,
    /// Two registers, high word first.
    Double,
}

/// Divisor applied to the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// No scaling.
    Unit,
    /// The model's voltage divisor.
    Voltage,
    /// The model's current divisor.
    Current,
    /// A divisor that does not depend on the model.
    Fixed(u16),
}

impl Scale {
    pub const fn divisor(&self, factors: ScaleFactors) -> u16 {
        match *self {
            Scale::Unit => 1,
            Scale::Voltage => factors.voltage,
            Scale::Current => factors.current,
            Scale::Fixed(divisor) => divisor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Where a quantity lives and how to decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSpec {
    pub address: u16,
    pub width: Width,
    /// Register holding the sign of the value, non-zero meaning negative.
    pub sign: Option<u16>,
    pub scale: Scale,
    pub access: Access,
}

impl RegisterSpec {
    const fn single(register: R, scale: Scale, access: Access) -> Self {
        RegisterSpec {
            address: register as u16,
            width: Width::Single,
            sign: None,
            scale,
            access,
        }
    }

    const fn signed(sign: R, magnitude: R) -> Self {
        RegisterSpec {
            address: magnitude as u16,
            width: Width::Single,
            sign: Some(sign as u16),
            scale: Scale::Unit,
            access: Access::ReadOnly,
        }
    }

    const fn double(high: R, scale: Scale) -> Self {
        RegisterSpec {
            address: high as u16,
            width: Width::Double,
            sign: None,
            scale,
            access: Access::ReadOnly,
        }
    }

    const fn last_address(&self) -> u16 {
        match self.width {
            Width::Single => self.address,
            Width::Double => self.address + 1,
        }
    }

    /// First register of the window this quantity is read from.
    pub const fn first_address(&self) -> u16 {
        match self.sign {
            Some(sign) if sign < self.address => sign,
            _ => self.address,
        }
    }

    /// Number of registers in the window.
    pub const fn span(&self) -> usize {
        let last = match self.sign {
            Some(sign) if sign > self.last_address() => sign,
            _ => self.last_address(),
        };
        (last - self.first_address() + 1) as usize
    }

    pub const fn is_writable(&self) -> bool {
        matches!(self.access, Access::ReadWrite) && matches!(self.width, Width::Single)
    }

    /// Decode the raw value from a window of registers starting at address `start`.
    ///
    /// Returns `None` if the window does not cover the quantity.
    pub fn decode_raw(&self, window: &[u16], start: u16) -> Option<i64> {
        let at = |address: u16| -> Option<u16> {
            let index = address.checked_sub(start)? as usize;
            window.get(index).copied()
        };

        let magnitude = match self.width {
            Width::Single => u32::from(at(self.address)?),
            Width::Double => combine_words(at(self.address)?, at(self.address + 1)?),
        };
        let negative = match self.sign {
            Some(sign) => at(sign)? != 0,
            None => false,
        };
        let magnitude = i64::from(magnitude);
        Some(if negative { -magnitude } else { magnitude })
    }

    /// Decode the physical value from a window of registers starting at address `start`.
    pub fn decode(&self, window: &[u16], start: u16, factors: ScaleFactors) -> Option<f64> {
        let raw = self.decode_raw(window, start)?;
        Some(to_physical(raw, self.scale.divisor(factors)))
    }
}

impl Quantity {
    pub const fn spec(&self) -> RegisterSpec {
        use Access::{ReadOnly as Ro, ReadWrite as Rw};
        use RegisterSpec as S;

        match self {
            Quantity::SetVoltage => S::single(R::VSet, Scale::Voltage, Rw),
            Quantity::SetCurrent => S::single(R::ISet, Scale::Current, Rw),
            Quantity::OutputVoltage => S::single(R::VOut, Scale::Voltage, Ro),
            Quantity::OutputCurrent => S::single(R::IOut, Scale::Current, Ro),
            Quantity::OutputCharge => S::single(R::AhOut, Scale::Fixed(1000), Ro),
            Quantity::OutputPower => S::single(R::Power, Scale::Fixed(100), Ro),
            Quantity::InputVoltage => S::single(R::UIn, Scale::Voltage, Ro),
            Quantity::InternalTemperature => S::signed(R::IntTempSign, R::IntTemp),
            Quantity::InternalTemperatureFahrenheit => S::signed(R::IntTempFSign, R::IntTempF),
            Quantity::ExternalTemperature => S::signed(R::ExtTempSign, R::ExtTemp),
            Quantity::ExternalTemperatureFahrenheit => S::signed(R::ExtTempFSign, R::ExtTempF),
            Quantity::ProtectionStatus => S::single(R::Protect, Scale::Unit, Ro),
            Quantity::ControlMode => S::single(R::CvCc, Scale::Unit, Ro),
            Quantity::OutputEnable => S::single(R::OnOff, Scale::Unit, Rw),
            Quantity::Backlight => S::single(R::Backlight, Scale::Unit, Rw),
            Quantity::OverVoltageProtection => S::single(R::Ovp, Scale::Voltage, Rw),
            Quantity::OverCurrentProtection => S::single(R::Ocp, Scale::Current, Rw),
            Quantity::BatteryActive => S::single(R::BatMode, Scale::Unit, Ro),
            Quantity::BatteryVoltage => S::single(R::BatVoltage, Scale::Unit, Ro),
            Quantity::BatteryCapacity => S::double(R::AhHigh, Scale::Fixed(1000)),
            Quantity::BatteryEnergy => S::double(R::WhHigh, Scale::Fixed(1000)),
        }
    }

    /// Short name, for log messages.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Convert a raw register value to a physical value.
pub fn to_physical(raw: i64, divisor: u16) -> f64 {
    raw as f64 / f64::from(divisor)
}

/// Convert a physical value to the nearest raw register value.
///
/// Returns `None` if the result does not fit in a register.
pub fn from_physical(value: f64, divisor: u16) -> Option<u16> {
    let raw = (value * f64::from(divisor)).round();
    if raw.is_finite() && (0.0..=f64::from(u16::MAX)).contains(&raw) {
        Some(raw as u16)
    } else {
        None
    }
}
