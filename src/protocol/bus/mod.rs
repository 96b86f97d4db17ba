//! The internal bus context object.
//!
//! [`InternalBus`] replaces module-level state: it owns the register interface
//! and the node identity, and borrows the caller's [`NodeStorage`]. Its
//! operations are split by concern:
//!
//! * bring-up in [`configurator`](crate::protocol::configurator),
//! * outbound frames in [`encoder`](crate::protocol::encoder),
//! * interrupt handling in [`dispatcher`](crate::protocol::dispatcher).
//!
//! [`SharedBus`] makes one instance reachable from both background code and
//! the interrupt vector.
mod shared;

pub use shared::SharedBus;

use crate::{
    core::{NodeRole, SlotIndex},
    infra::registers::{BusRegisters, StatusKind},
    protocol::{
        allocator::TxSlotAllocator, identity::NodeId, identity::NodeIdentity,
        slots::SlotLayout, storage::NodeStorage,
    },
};

/// Communication layer of one node on the internal bus.
pub struct InternalBus<'a, R: BusRegisters> {
    pub(crate) regs: R,
    pub(crate) identity: NodeIdentity,
    pub(crate) layout: SlotLayout,
    pub(crate) allocator: TxSlotAllocator,
    pub(crate) storage: &'a NodeStorage,
    /// Slave addressed by the request currently occupying the request slot.
    pub(crate) outstanding_request: Option<NodeId>,
}

impl<'a, R: BusRegisters> InternalBus<'a, R> {
    #[inline]
    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    #[inline]
    pub fn role(&self) -> NodeRole {
        self.identity.role()
    }

    #[inline]
    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    #[inline]
    pub fn storage(&self) -> &'a NodeStorage {
        self.storage
    }

    /// Slave whose answer is still awaited on the request slot.
    #[inline]
    pub fn outstanding_request(&self) -> Option<NodeId> {
        self.outstanding_request
    }

    /// Hardware bitmap of message objects with a transmission pending.
    pub fn pending_transmissions(&mut self) -> u32 {
        self.regs.status(StatusKind::TxRequest)
    }

    /// Whether `slot` still has a transmission pending in hardware.
    pub fn is_pending(&mut self, slot: SlotIndex) -> bool {
        self.pending_transmissions() & slot.bit() != 0
    }

    /// Direct access to the register interface.
    pub fn registers(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register interface back, dropping the bus state.
    pub fn release(self) -> R {
        self.regs
    }
}
