//! Narrow abstraction over a message-object based CAN controller (Bosch C_CAN
//! style, as found on TM4C parts). Lets the protocol layer run against a real
//! peripheral or a deterministic software double.
//!
//! No policy lives behind this trait: implementations forward each call to the
//! matching register access and nothing else.
//!
//! # Interrupt contract
//!
//! [`BusRegisters::interrupt_cause`] reports a single cause. The dispatcher
//! services exactly that cause and returns. Implementations targeting real
//! hardware must guarantee that the interrupt line stays asserted while any
//! cause remains pending (level-triggered), so the handler is re-entered until
//! every cause has been serviced.
use crate::{
    core::SlotIndex,
    infra::bit_timing::BitTiming,
    protocol::message_object::{CanFrame, MessageObject},
};

/// Raw cause value meaning "no interrupt pending".
pub const CAUSE_NONE: u32 = 0x0000;

/// Raw cause value of a controller status interrupt.
pub const CAUSE_STATUS: u32 = 0x8000;

/// Status words that can be read back from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusKind {
    /// Controller status register. Reading it clears a pending status interrupt.
    Control,
    /// Bitmap of message objects with a transmission pending (bit `n-1` = slot `n`).
    TxRequest,
    /// Bitmap of message objects holding unread received data.
    NewData,
    /// Bitmap of message objects currently configured.
    MessageValid,
}

/// Register-level capability of the CAN peripheral.
pub trait BusRegisters {
    /// Enable the peripheral clock domain.
    fn enable_clock(&mut self);

    /// Whether the peripheral reports ready after [`enable_clock`](Self::enable_clock).
    fn is_ready(&mut self) -> bool;

    /// Put the controller in its reset/init state.
    fn reset(&mut self);

    /// Program the bit timing registers.
    fn set_bit_timing(&mut self, timing: &BitTiming);

    /// Leave init mode and take part in bus traffic.
    fn enable(&mut self);

    /// Enable or disable automatic retransmission after an error or lost arbitration.
    fn set_auto_retry(&mut self, enabled: bool);

    /// Unmask the controller interrupts (master, error and status sources).
    fn enable_interrupts(&mut self);

    /// Write the full configuration of one message object. For transmit-type
    /// objects this also sets the transmission request.
    fn configure_object(&mut self, slot: SlotIndex, object: &MessageObject);

    /// Clear the valid flag of one message object: it stops matching incoming
    /// frames, and its transmission request and pending interrupt are dropped.
    fn invalidate_object(&mut self, slot: SlotIndex);

    /// Current interrupt cause: [`CAUSE_NONE`], a slot number in `1..=32`, or
    /// [`CAUSE_STATUS`].
    fn interrupt_cause(&mut self) -> u32;

    /// Read one of the status words.
    fn status(&mut self, kind: StatusKind) -> u32;

    /// Read the frame held by a message object and clear its pending interrupt
    /// and new-data flags.
    fn fetch(&mut self, slot: SlotIndex) -> CanFrame;

    /// Clear the pending interrupt of one message object.
    fn clear_interrupt(&mut self, slot: SlotIndex);
}
