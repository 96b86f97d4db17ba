//! Interrupt-context dispatcher.
//!
//! One call services exactly one cause, read from the controller:
//!
//! ```text
//! cause         action
//! 0             nothing pending, counted as spurious
//! 0x8000        read status (clears it); bus-off / passive / warning → fault
//! fixed slot    per slot table: drain into RX / remote buffer, or acknowledge
//! 1..=30        transmit done: clear the pending interrupt
//! other         counted as unexpected, reported as fault
//! ```
//!
//! Nothing here blocks or allocates. Faults are never swallowed silently: they
//! land in [`BusDiagnostics`](crate::protocol::storage::BusDiagnostics) and are
//! returned to the caller.
use crate::{
    core::SlotIndex,
    error::BusFault,
    infra::{
        registers::{BusRegisters, StatusKind},
        status::{ControllerStatus, InterruptCause},
    },
    protocol::{
        bus::InternalBus,
        slots::{BufferKind, FixedObject, FixedPurpose, InterruptAction},
        storage::BufferSnapshot,
    },
};

/// Outcome of one dispatcher entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// No cause was pending.
    Idle,
    /// Healthy status change (TxOK / RxOK / last error code).
    Status(ControllerStatus),
    /// Condition the owning layer has to act on.
    Fault(BusFault),
    /// A frame was stored into one of the caller's buffers.
    Received {
        slot: SlotIndex,
        buffer: BufferKind,
        snapshot: BufferSnapshot,
    },
    /// A frame with a length other than two bytes was discarded.
    Malformed(SlotIndex),
    /// The slave's automatic answer went out.
    ResponseSent(SlotIndex),
    /// A transient transmit slot finished.
    TransmitComplete(SlotIndex),
}

impl<'a, R: BusRegisters> InternalBus<'a, R> {
    /// Service the current interrupt cause.
    pub fn on_interrupt(&mut self) -> Dispatch {
        let raw = self.regs.interrupt_cause();
        match InterruptCause::from_raw(raw) {
            InterruptCause::None => {
                self.storage.diagnostics.record_spurious();
                Dispatch::Idle
            }
            InterruptCause::Status => self.service_status(),
            InterruptCause::Object(slot) => match self.layout.fixed(slot) {
                Some(entry) => self.service_fixed(entry),
                None => {
                    self.regs.clear_interrupt(slot);
                    Dispatch::TransmitComplete(slot)
                }
            },
            InterruptCause::Unknown(cause) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Unexpected interrupt cause {=u32:#x}", cause);

                self.storage.diagnostics.record_unexpected_cause(cause);
                Dispatch::Fault(BusFault::UnexpectedInterruptCause { cause })
            }
        }
    }

    fn service_status(&mut self) -> Dispatch {
        let status = ControllerStatus::from_bits(self.regs.status(StatusKind::Control));
        if !status.is_fault() {
            return Dispatch::Status(status);
        }

        #[cfg(feature = "defmt")]
        defmt::error!("Controller fault: {}", status);

        self.storage.diagnostics.record_status_fault(status);
        Dispatch::Fault(BusFault::ControllerStatusFault { status })
    }

    fn service_fixed(&mut self, entry: FixedObject) -> Dispatch {
        let slot = entry.slot;
        let buffer = match entry.action {
            InterruptAction::Acknowledge => {
                self.regs.clear_interrupt(slot);
                return Dispatch::ResponseSent(slot);
            }
            InterruptAction::Drain(buffer) => buffer,
        };

        let frame = self.regs.fetch(slot);
        // One answer per request: left valid, the exact filter would keep
        // catching the slave's later pushes ahead of the receive slot.
        if entry.purpose == FixedPurpose::SlaveRequest {
            self.regs.invalidate_object(slot);
            self.outstanding_request = None;
        }

        let Some(data) = frame.payload() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropping {=usize}-byte frame on slot {}", frame.len, slot);

            self.storage.diagnostics.record_malformed();
            return Dispatch::Malformed(slot);
        };

        let snapshot = match buffer {
            BufferKind::Rx => self.storage.rx.store(data),
            BufferKind::Remote => self.storage.remote.store(data),
        };

        #[cfg(feature = "defmt")]
        defmt::trace!("Slot {} → {} buffer: {=[u8]:#x}", slot, buffer, &data[..]);

        Dispatch::Received {
            slot,
            buffer,
            snapshot,
        }
    }
}
