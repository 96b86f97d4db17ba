//! Decoding of the interrupt cause and controller status words.
//!
//! # Controller status layout
//!
//! ```text
//! Bits 0-2 : Last error code (LEC)
//! Bit  3   : Transmitted OK
//! Bit  4   : Received OK
//! Bit  5   : Error passive
//! Bit  6   : Error warning (a counter reached 96)
//! Bit  7   : Bus-off
//! ```
use crate::core::SlotIndex;
use crate::infra::registers::{CAUSE_NONE, CAUSE_STATUS};

//==================================================================================INTERRUPT_CAUSE
/// Classified content of the interrupt cause register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptCause {
    /// Nothing pending (spurious entry).
    None,
    /// Controller status changed.
    Status,
    /// A message object raised its interrupt.
    Object(SlotIndex),
    /// Value outside the documented set.
    Unknown(u32),
}

impl InterruptCause {
    /// Classify a raw cause value.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            CAUSE_NONE => InterruptCause::None,
            CAUSE_STATUS => InterruptCause::Status,
            1..=32 => match SlotIndex::new(raw as u8) {
                Some(slot) => InterruptCause::Object(slot),
                None => InterruptCause::Unknown(raw),
            },
            _ => InterruptCause::Unknown(raw),
        }
    }
}

//==================================================================================LAST_ERROR
/// Last error code reported by the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LastError {
    None,
    Stuff,
    Form,
    Ack,
    Bit1,
    Bit0,
    Crc,
    /// No bus event since the code was last written by the CPU.
    Unused,
}

//==================================================================================CONTROLLER_STATUS
/// Typed view over the controller status register.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerStatus(u32);

impl ControllerStatus {
    const LEC_MASK: u32 = 0x07;
    const TX_OK: u32 = 1 << 3;
    const RX_OK: u32 = 1 << 4;
    const ERROR_PASSIVE: u32 = 1 << 5;
    const ERROR_WARNING: u32 = 1 << 6;
    const BUS_OFF: u32 = 1 << 7;

    /// Wrap a raw register value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn last_error(&self) -> LastError {
        match self.0 & Self::LEC_MASK {
            0 => LastError::None,
            1 => LastError::Stuff,
            2 => LastError::Form,
            3 => LastError::Ack,
            4 => LastError::Bit1,
            5 => LastError::Bit0,
            6 => LastError::Crc,
            _ => LastError::Unused,
        }
    }

    pub const fn tx_ok(&self) -> bool {
        self.0 & Self::TX_OK != 0
    }

    pub const fn rx_ok(&self) -> bool {
        self.0 & Self::RX_OK != 0
    }

    pub const fn is_error_passive(&self) -> bool {
        self.0 & Self::ERROR_PASSIVE != 0
    }

    pub const fn is_error_warning(&self) -> bool {
        self.0 & Self::ERROR_WARNING != 0
    }

    pub const fn is_bus_off(&self) -> bool {
        self.0 & Self::BUS_OFF != 0
    }

    /// Bus-off or an error threshold: must be surfaced to the owning layer.
    pub const fn is_fault(&self) -> bool {
        self.is_bus_off() || self.is_error_passive() || self.is_error_warning()
    }
}

impl core::fmt::Debug for ControllerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerStatus")
            .field("bus_off", &self.is_bus_off())
            .field("error_passive", &self.is_error_passive())
            .field("error_warning", &self.is_error_warning())
            .field("last_error", &self.last_error())
            .finish()
    }
}
