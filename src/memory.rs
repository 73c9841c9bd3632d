//! Memory slots M0 - M9, the ten stored presets.
//!
//! Each slot is four consecutive registers starting at `80 + slot * 4`. M0 holds the
//! settings currently in use, so its protection registers are the same registers as
//! [`Quantity::OverVoltageProtection`](crate::quantity::Quantity::OverVoltageProtection) and
//! [`Quantity::OverCurrentProtection`](crate::quantity::Quantity::OverCurrentProtection).

use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};
use thiserror::Error;

use crate::{
    error::{Error, Result},
    model::ScaleFactors,
    psu::RdPsu,
    quantity::{Scale, from_physical, to_physical},
    register::RdRegister,
    transport::Transport,
};

/// The base address of the first memory slot.
///
/// Base address of slot = MEMORY_OFFSET + {slot number} * SLOT_SIZE.
pub const MEMORY_OFFSET: u16 = RdRegister::MemoryBase as u16;

/// Registers per slot.
pub const SLOT_SIZE: u16 = MemoryOffsets::COUNT as u16;

/// These are the offsets from the base address of each memory slot.
#[derive(Debug, Copy, Clone, EnumCountMacro, EnumIter, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum MemoryOffsets {
    /// __R/W__ - Voltage setting.
    VSet = 0x00,
    /// __R/W__ - Current setting.
    ISet = 0x01,
    /// __R/W__ - Over voltage protection.
    SOvp = 0x02,
    /// __R/W__ - Over current protection.
    SOcp = 0x03,
}

impl MemoryOffsets {
    /// Return the address of this register in the given slot.
    pub fn address_in_slot(&self, slot: MemorySlot) -> u16 {
        slot.base_address() + *self as u16
    }

    pub fn scale(&self) -> Scale {
        match self {
            MemoryOffsets::VSet | MemoryOffsets::SOvp => Scale::Voltage,
            MemoryOffsets::ISet | MemoryOffsets::SOcp => Scale::Current,
        }
    }
}

/// This enum represents all memory slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro, EnumIter)]
#[repr(u16)]
pub enum MemorySlot {
    M0 = 0x00,
    M1 = 0x01,
    M2 = 0x02,
    M3 = 0x03,
    M4 = 0x04,
    M5 = 0x05,
    M6 = 0x06,
    M7 = 0x07,
    M8 = 0x08,
    M9 = 0x09,
}

impl MemorySlot {
    pub const ALL: [MemorySlot; MemorySlot::COUNT] = [
        MemorySlot::M0,
        MemorySlot::M1,
        MemorySlot::M2,
        MemorySlot::M3,
        MemorySlot::M4,
        MemorySlot::M5,
        MemorySlot::M6,
        MemorySlot::M7,
        MemorySlot::M8,
        MemorySlot::M9,
    ];

    pub fn index(&self) -> u16 {
        *self as u16
    }

    /// First register of this slot.
    pub fn base_address(&self) -> u16 {
        MEMORY_OFFSET + self.index() * SLOT_SIZE
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Memory slot {0} does not exist")]
pub struct InvalidSlot(pub u16);

impl TryFrom<u16> for MemorySlot {
    type Error = InvalidSlot;

    fn try_from(value: u16) -> core::result::Result<Self, Self::Error> {
        MemorySlot::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(InvalidSlot(value))
    }
}

/// Settings stored in one memory slot, in volts and amps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoryPreset {
    pub set_voltage: f64,
    pub set_current: f64,
    pub over_voltage_protection: f64,
    pub over_current_protection: f64,
}

impl MemoryPreset {
    /// Decode a preset from the four registers of a slot.
    pub fn from_registers(regs: &[u16; SLOT_SIZE as usize], factors: ScaleFactors) -> Self {
        use MemoryOffsets as MO;

        let value = |offset: MO| {
            to_physical(
                i64::from(regs[offset as usize]),
                offset.scale().divisor(factors),
            )
        };
        MemoryPreset {
            set_voltage: value(MO::VSet),
            set_current: value(MO::ISet),
            over_voltage_protection: value(MO::SOvp),
            over_current_protection: value(MO::SOcp),
        }
    }

    /// Encode this preset as register values.
    ///
    /// Returns `None` if any value does not fit in a register.
    pub fn to_registers(&self, factors: ScaleFactors) -> Option<[u16; SLOT_SIZE as usize]> {
        use MemoryOffsets as MO;

        let raw = |offset: MO, value: f64| from_physical(value, offset.scale().divisor(factors));
        Some([
            raw(MO::VSet, self.set_voltage)?,
            raw(MO::ISet, self.set_current)?,
            raw(MO::SOvp, self.over_voltage_protection)?,
            raw(MO::SOcp, self.over_current_protection)?,
        ])
    }
}

impl<T: Transport> RdPsu<T> {
    /// Read the preset stored in a memory slot.
    pub fn read_memory_slot(&mut self, slot: MemorySlot) -> Result<MemoryPreset, T::Error> {
        let mut regs = [0u16; SLOT_SIZE as usize];
        self.accessor().read_many(slot.base_address(), &mut regs)?;
        Ok(MemoryPreset::from_registers(&regs, self.scale_factors()))
    }

    /// Store a preset in a memory slot, all four registers in one request.
    ///
    /// Writing M0 changes the active output settings and protection levels.
    pub fn write_memory_slot(
        &mut self,
        slot: MemorySlot,
        preset: &MemoryPreset,
    ) -> Result<(), T::Error> {
        let regs = preset
            .to_registers(self.scale_factors())
            .ok_or(Error::InvalidRange)?;
        log::debug!("write memory slot {:?}: {:?}", slot, regs);
        self.accessor().write_many(slot.base_address(), &regs)
    }
}
