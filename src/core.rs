//! Data types and constants shared by the register interface, the role
//! configurator, the encoder and the interrupt dispatcher.
//!
//! The message object pool is a platform constant: 32 slots, numbered from 1.
//! The two highest slots are reserved for fixed receive/response duty and the
//! rest are handed out per transmission.

/// Number of hardware message objects on the controller.
pub const SLOT_COUNT: u8 = 32;

/// Highest slot index available for transient transmissions.
pub const LAST_TRANSIENT_SLOT: u8 = 30;

/// Every frame of this protocol carries exactly two data bytes.
pub const PAYLOAD_LEN: usize = 2;

/// Largest value representable in a 29-bit extended identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Bit separating master and slave identifiers.
///
/// The master's identifier has it set, every slave identifier has it clear. The
/// master's filtered receive object relies on this bit alone, so it binds the
/// whole deployment's identifier allocation.
pub const DISCRIMINATOR_BIT: u32 = 1 << 0;

/// Two-byte value exchanged on the bus (command, data, or response).
pub type Payload = [u8; PAYLOAD_LEN];

//==================================================================================NODE_ROLE
/// Role of a node on the internal bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeRole {
    /// Issues commands and polls slaves.
    Master,
    /// Answers the master and may push data unsolicited.
    Slave,
}

//==================================================================================SLOT_INDEX
/// Index of a hardware message object, in `1..=SLOT_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Build a slot index, rejecting `0` and anything above [`SLOT_COUNT`].
    #[inline]
    pub const fn new(index: u8) -> Option<Self> {
        if index == 0 || index > SLOT_COUNT {
            None
        } else {
            Some(Self(index))
        }
    }

    /// Raw 1-based index.
    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Bit representing this slot in the controller's 32-bit status bitmaps
    /// (slot `n` maps to bit `n - 1`).
    #[inline]
    pub const fn bit(&self) -> u32 {
        1 << (self.0 - 1)
    }

    /// Whether this slot is part of the transient transmit range.
    #[inline]
    pub const fn is_transient(&self) -> bool {
        self.0 <= LAST_TRANSIENT_SLOT
    }
}

impl From<SlotIndex> for u8 {
    fn from(value: SlotIndex) -> Self {
        value.0
    }
}
