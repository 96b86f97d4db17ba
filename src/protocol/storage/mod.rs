//! Caller-owned storage shared between background code and the interrupt
//! dispatcher.
//!
//! Every access takes a short critical section through
//! [`embassy_sync::blocking_mutex::Mutex`], so a 2-byte value and its sequence
//! number are always read and written as one unit. The bus layer only ever
//! holds a shared reference to [`NodeStorage`]; the borrow ties the storage's
//! lifetime to the bus.
use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    signal::Signal,
};

use crate::core::{Payload, PAYLOAD_LEN};
use crate::infra::status::ControllerStatus;

//==================================================================================SHARED_BUFFER
/// Consistent copy of a [`SharedBuffer`] taken under one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferSnapshot {
    /// Stored bytes.
    pub data: Payload,
    /// Number of writes since creation (wrapping).
    pub sequence: u32,
}

/// Two-byte value written by one context and read by the other.
pub struct SharedBuffer {
    cell: Mutex<CriticalSectionRawMutex, Cell<BufferSnapshot>>,
    updated: Signal<CriticalSectionRawMutex, BufferSnapshot>,
}

impl SharedBuffer {
    /// Buffer holding `initial`, sequence 0.
    pub const fn new(initial: Payload) -> Self {
        Self {
            cell: Mutex::new(Cell::new(BufferSnapshot {
                data: initial,
                sequence: 0,
            })),
            updated: Signal::new(),
        }
    }

    /// Current bytes.
    pub fn load(&self) -> Payload {
        self.snapshot().data
    }

    /// Current bytes and sequence number.
    pub fn snapshot(&self) -> BufferSnapshot {
        self.cell.lock(|cell| cell.get())
    }

    /// Replace the bytes and bump the sequence number. Wakes any task waiting
    /// in [`changed`](Self::changed).
    pub fn store(&self, data: Payload) -> BufferSnapshot {
        let snapshot = self.cell.lock(|cell| {
            let next = BufferSnapshot {
                data,
                sequence: cell.get().sequence.wrapping_add(1),
            };
            cell.set(next);
            next
        });
        self.updated.signal(snapshot);
        snapshot
    }

    /// Wait for the next [`store`](Self::store). If writes happened since the
    /// last wait, returns the latest one immediately.
    pub async fn changed(&self) -> BufferSnapshot {
        self.updated.wait().await
    }
}

impl Default for SharedBuffer {
    fn default() -> Self {
        Self::new([0; PAYLOAD_LEN])
    }
}

//==================================================================================DIAGNOSTICS
/// Counters of anomalies seen in interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultCounters {
    /// Cause values outside the documented set.
    pub unexpected_causes: u32,
    /// Last unexpected raw cause value.
    pub last_unexpected_cause: Option<u32>,
    /// Bus-off / error-passive / error-warning reports.
    pub status_faults: u32,
    /// Last faulty controller status.
    pub last_status_fault: Option<ControllerStatus>,
    /// Entries with no cause pending.
    pub spurious: u32,
    /// Received frames whose length was not the protocol's two bytes.
    pub malformed_frames: u32,
}

/// Fault log filled by the dispatcher and read by background code.
pub struct BusDiagnostics {
    counters: Mutex<CriticalSectionRawMutex, Cell<FaultCounters>>,
    status_fault: Signal<CriticalSectionRawMutex, ControllerStatus>,
}

impl BusDiagnostics {
    pub const fn new() -> Self {
        Self {
            counters: Mutex::new(Cell::new(FaultCounters {
                unexpected_causes: 0,
                last_unexpected_cause: None,
                status_faults: 0,
                last_status_fault: None,
                spurious: 0,
                malformed_frames: 0,
            })),
            status_fault: Signal::new(),
        }
    }

    /// Copy of the counters.
    pub fn counters(&self) -> FaultCounters {
        self.counters.lock(|cell| cell.get())
    }

    /// Copy the counters and zero them.
    pub fn take_counters(&self) -> FaultCounters {
        self.counters.lock(|cell| cell.replace(FaultCounters::default()))
    }

    /// Latest controller fault not yet consumed, if any.
    pub fn take_status_fault(&self) -> Option<ControllerStatus> {
        self.status_fault.try_take()
    }

    /// Wait until the dispatcher reports a controller fault.
    pub async fn wait_status_fault(&self) -> ControllerStatus {
        self.status_fault.wait().await
    }

    pub(crate) fn record_unexpected_cause(&self, cause: u32) {
        self.update(|c| {
            c.unexpected_causes = c.unexpected_causes.wrapping_add(1);
            c.last_unexpected_cause = Some(cause);
        });
    }

    pub(crate) fn record_status_fault(&self, status: ControllerStatus) {
        self.update(|c| {
            c.status_faults = c.status_faults.wrapping_add(1);
            c.last_status_fault = Some(status);
        });
        self.status_fault.signal(status);
    }

    pub(crate) fn record_spurious(&self) {
        self.update(|c| c.spurious = c.spurious.wrapping_add(1));
    }

    pub(crate) fn record_malformed(&self) {
        self.update(|c| c.malformed_frames = c.malformed_frames.wrapping_add(1));
    }

    fn update(&self, f: impl FnOnce(&mut FaultCounters)) {
        self.counters.lock(|cell| {
            let mut counters = cell.get();
            f(&mut counters);
            cell.set(counters);
        });
    }
}

impl Default for BusDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================NODE_STORAGE
/// Everything the service layer owns and the bus layer borrows.
///
/// Usually placed in a `static`:
///
/// ```rust
/// use canlight::protocol::storage::NodeStorage;
///
/// static STORAGE: NodeStorage = NodeStorage::new();
/// STORAGE.command.store([0xF2, 0x31]);
/// assert_eq!(STORAGE.command.load(), [0xF2, 0x31]);
/// ```
pub struct NodeStorage {
    /// Data received on the fixed receive slot.
    pub rx: SharedBuffer,
    /// Master: answers to requests. Slave: value served to remote requests.
    ///
    /// On a slave the controller answers from its own copy, programmed at
    /// bring-up and by
    /// [`publish_response`](crate::protocol::bus::InternalBus::publish_response).
    /// Storing here directly after bring-up changes the buffer only; the
    /// master keeps receiving the old value until the next `publish_response`.
    pub remote: SharedBuffer,
    /// Command the master sends on each polling cycle.
    pub command: SharedBuffer,
    /// Faults recorded in interrupt context.
    pub diagnostics: BusDiagnostics,
}

impl NodeStorage {
    pub const fn new() -> Self {
        Self {
            rx: SharedBuffer::new([0; PAYLOAD_LEN]),
            remote: SharedBuffer::new([0; PAYLOAD_LEN]),
            command: SharedBuffer::new([0; PAYLOAD_LEN]),
            diagnostics: BusDiagnostics::new(),
        }
    }
}

impl Default for NodeStorage {
    fn default() -> Self {
        Self::new()
    }
}
