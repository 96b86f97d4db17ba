//! Role-parameterized slot table.
//!
//! The same hardware slot numbers serve different purposes for the master and
//! for a slave. Instead of hardcoding indices at every call site, the table is
//! built once from the node role and consulted by the configurator, the encoder
//! and the dispatcher.
//!
//! ```text
//!            slot 31 (auxiliary)          slot 32 (receive)
//! Master     request → remote buffer      receive from slaves → RX buffer
//! Slave      auto-respond (ack only)      receive from master → RX buffer
//! ```
use crate::core::{NodeRole, SlotIndex, LAST_TRANSIENT_SLOT, SLOT_COUNT};

/// Purpose of a fixed (reserved) message object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixedPurpose {
    /// Master: filtered receive of every slave frame.
    ReceiveFromSlaves,
    /// Master: remote request to one slave, then its answer.
    SlaveRequest,
    /// Slave: exact receive of frames addressed to this node.
    ReceiveFromMaster,
    /// Slave: hardware answer to the master's remote requests.
    AutoRespond,
}

/// Caller-owned buffer a fixed object drains into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferKind {
    Rx,
    Remote,
}

/// What the dispatcher does when a fixed object raises its interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptAction {
    /// Fetch the stored frame into the given buffer.
    Drain(BufferKind),
    /// Transmission done: clear the pending bit only.
    Acknowledge,
}

/// One entry of the slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedObject {
    pub slot: SlotIndex,
    pub purpose: FixedPurpose,
    pub action: InterruptAction,
}

/// Slot assignment for one node role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotLayout {
    role: NodeRole,
    /// Request slot (master) or auto-respond slot (slave).
    auxiliary: FixedObject,
    /// Fixed receive slot.
    receive: FixedObject,
}

// Both constants are within 1..=32.
const AUXILIARY_SLOT: SlotIndex = match SlotIndex::new(SLOT_COUNT - 1) {
    Some(slot) => slot,
    None => panic!("auxiliary slot out of range"),
};
const RECEIVE_SLOT: SlotIndex = match SlotIndex::new(SLOT_COUNT) {
    Some(slot) => slot,
    None => panic!("receive slot out of range"),
};

impl SlotLayout {
    /// Build the table for a role.
    pub const fn for_role(role: NodeRole) -> Self {
        match role {
            NodeRole::Master => Self {
                role,
                auxiliary: FixedObject {
                    slot: AUXILIARY_SLOT,
                    purpose: FixedPurpose::SlaveRequest,
                    action: InterruptAction::Drain(BufferKind::Remote),
                },
                receive: FixedObject {
                    slot: RECEIVE_SLOT,
                    purpose: FixedPurpose::ReceiveFromSlaves,
                    action: InterruptAction::Drain(BufferKind::Rx),
                },
            },
            NodeRole::Slave => Self {
                role,
                auxiliary: FixedObject {
                    slot: AUXILIARY_SLOT,
                    purpose: FixedPurpose::AutoRespond,
                    action: InterruptAction::Acknowledge,
                },
                receive: FixedObject {
                    slot: RECEIVE_SLOT,
                    purpose: FixedPurpose::ReceiveFromMaster,
                    action: InterruptAction::Drain(BufferKind::Rx),
                },
            },
        }
    }

    #[inline]
    pub const fn role(&self) -> NodeRole {
        self.role
    }

    /// Request slot (master) or auto-respond slot (slave).
    #[inline]
    pub const fn auxiliary(&self) -> FixedObject {
        self.auxiliary
    }

    #[inline]
    pub const fn receive(&self) -> FixedObject {
        self.receive
    }

    /// Table entry for `slot`, if it is one of the reserved objects.
    pub fn fixed(&self, slot: SlotIndex) -> Option<FixedObject> {
        [self.auxiliary, self.receive]
            .into_iter()
            .find(|entry| entry.slot == slot)
    }

    /// First and last slot of the transient transmit range.
    pub const fn transient_range(&self) -> (u8, u8) {
        (1, LAST_TRANSIENT_SLOT)
    }
}
