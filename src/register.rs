//! This module is used to define the registers on the RD60xx PSUs.
//!
//! These addresses are the firmware's external contract and must not be renumbered.

use strum_macros::EnumIter;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum RdRegister {
    /// __R__ - Product model, ten times the model number plus a variant digit.
    ///
    /// E.g. `60062` for an RD6006.
    Model = 0,
    /// __R__ - Serial number, upper 16 bits.
    SerialHigh = 1,
    /// __R__ - Serial number, lower 16 bits.
    SerialLow = 2,
    /// __R__ - Firmware version in hundredths. E.g. `128` => `1.28`.
    Firmware = 3,
    /// __R__ - Internal temperature sign, non-zero means negative.
    IntTempSign = 4,
    /// __R__ - Internal temperature magnitude in °C.
    IntTemp = 5,
    /// __R__ - Internal temperature sign (°F reading).
    IntTempFSign = 6,
    /// __R__ - Internal temperature magnitude in °F.
    IntTempF = 7,
    /// __R/W__ - Voltage setting.
    VSet = 8,
    /// __R/W__ - Current setting.
    ISet = 9,
    /// __R__ - Output voltage display value.
    VOut = 10,
    /// __R__ - Output current display value.
    IOut = 11,
    /// __R__ - Output charge, mAh.
    AhOut = 12,
    /// __R__ - Output power display value, centi-watts.
    Power = 13,
    /// __R__ - Input voltage display value.
    UIn = 14,
    /// __R__ - Protect status.
    ///
    /// See [`ProtectionStatus`] for possible values.
    Protect = 16,
    /// __R__ - Constant voltage constant current state.
    /// * `0` - CV.
    /// * `1` - CC.
    CvCc = 17,
    /// __R/W__ - Switched output.
    OnOff = 18,
    /// __R__ - Battery mode active.
    BatMode = 32,
    /// __R__ - Battery voltage.
    BatVoltage = 33,
    /// __R__ - External probe temperature sign.
    ExtTempSign = 34,
    /// __R__ - External probe temperature magnitude in °C.
    ExtTemp = 35,
    /// __R__ - External probe temperature sign (°F reading).
    ExtTempFSign = 36,
    /// __R__ - External probe temperature magnitude in °F.
    ExtTempF = 37,
    /// __R__ - Battery capacity, upper 16 bits. Lower half follows.
    AhHigh = 38,
    /// __R__ - Battery capacity, lower 16 bits.
    AhLow = 39,
    /// __R__ - Battery energy, upper 16 bits. Lower half follows.
    WhHigh = 40,
    /// __R__ - Battery energy, lower 16 bits.
    WhLow = 41,
    /// __R/W__ - Clock year.
    Year = 48,
    /// __R/W__ - Clock month.
    Month = 49,
    /// __R/W__ - Clock day.
    Day = 50,
    /// __R/W__ - Clock hour.
    Hour = 51,
    /// __R/W__ - Clock minute.
    Minute = 52,
    /// __R/W__ - Clock second.
    Second = 53,
    /// __R/W__ - Backlight brightness level.
    ///
    /// 0 is darkest, 5 is the brightest.
    Backlight = 72,
    /// __R/W__ - First register of memory slot M0.
    ///
    /// See [`crate::memory`] for the slot layout.
    MemoryBase = 80,
    /// __R/W__ - Over-voltage protection level of the active settings (M0).
    Ovp = 82,
    /// __R/W__ - Over-current protection level of the active settings (M0).
    Ocp = 83,
}

impl From<RdRegister> for u16 {
    fn from(value: RdRegister) -> Self {
        value as u16
    }
}

/// Represents the two possible power supply control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

impl From<u16> for ControlMode {
    fn from(value: u16) -> Self {
        match value {
            0x00 => ControlMode::Cv,
            _ => ControlMode::Cc,
        }
    }
}

impl From<ControlMode> for u16 {
    fn from(value: ControlMode) -> Self {
        match value {
            ControlMode::Cv => 0x00,
            ControlMode::Cc => 0x01,
        }
    }
}

/// Used to be less ambiguous and whether something is on or off.
#[repr(u16)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off = 0x00,
    /// Enabled.
    On = 0x01,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// "Protection status register".
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum ProtectionStatus {
    /// 0: No protection tripped.
    Normal = 0x00,
    /// 1: OVP overvoltage protection.
    OverVoltage = 0x01,
    /// 2: OCP overcurrent protection.
    OverCurrent = 0x02,
}

impl From<u16> for ProtectionStatus {
    fn from(value: u16) -> Self {
        match value {
            0x01 => ProtectionStatus::OverVoltage,
            0x02 => ProtectionStatus::OverCurrent,
            // Default to no alarms active if outside of expected values.
            _ => ProtectionStatus::Normal,
        }
    }
}

/// Which sensor a temperature reading comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureProbe {
    /// Sensor on the PSU board.
    Internal,
    /// Optional external probe.
    External,
}

/// Unit of a temperature reading. The PSU reports both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}
