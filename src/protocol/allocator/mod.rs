//! Transient transmit slot allocation.
//!
//! Slot occupancy is never tracked in software: the controller's
//! transmit-request bitmap is the only source of truth. A slot becomes reusable
//! as soon as the hardware clears its pending bit, so nothing is ever "freed".
//!
//! The scan prefers the lowest free index. Lower slots win the controller's
//! internal transmit arbitration, which lines up with CAN's lowest-id-wins rule
//! for how this protocol issues frames.
use crate::core::SlotIndex;
use crate::infra::registers::{BusRegisters, StatusKind};
use crate::protocol::slots::SlotLayout;

/// Scan-and-claim over the transient slot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSlotAllocator {
    first: u8,
    last: u8,
}

impl TxSlotAllocator {
    /// Allocator over the transient range of `layout`.
    pub const fn new(layout: &SlotLayout) -> Self {
        let (first, last) = layout.transient_range();
        Self { first, last }
    }

    /// Lowest slot in the transient range whose pending bit is clear, or
    /// `None` when every one of them is pending. Bits outside the range are
    /// ignored.
    pub fn lowest_free(&self, pending: u32) -> Option<SlotIndex> {
        (self.first..=self.last)
            .filter_map(SlotIndex::new)
            .find(|slot| pending & slot.bit() == 0)
    }

    /// Read the pending bitmap from the controller and pick a slot.
    ///
    /// Pure read-and-scan: never blocks, never retries. Must not be used from
    /// the interrupt dispatcher.
    pub fn find_available<R: BusRegisters>(&self, regs: &mut R) -> Option<SlotIndex> {
        let pending = regs.status(StatusKind::TxRequest);
        let slot = self.lowest_free(pending);

        #[cfg(feature = "defmt")]
        match slot {
            Some(slot) => defmt::trace!("TX bitmap {=u32:#x}: claiming slot {}", pending, slot),
            None => defmt::debug!("TX bitmap {=u32:#x}: no free slot", pending),
        }

        slot
    }

    /// Number of slots in the transient range.
    pub const fn capacity(&self) -> u8 {
        self.last - self.first + 1
    }
}
