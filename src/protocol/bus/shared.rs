//! Binding of one [`InternalBus`] to both execution contexts.
//!
//! Background code and the interrupt vector reach the bus through the same
//! critical-section mutex, so an encoder call and the dispatcher never
//! interleave. Sections are short: one register sequence each. The bounded
//! readiness wait of [`SharedBus::init`] runs before the first section.
//!
//! ```rust,ignore
//! static STORAGE: NodeStorage = NodeStorage::new();
//! static BUS: SharedBus<'static, Can0Registers> = SharedBus::uninit();
//!
//! fn bring_up(regs: Can0Registers) -> Result<(), InitFailure<Can0Registers>> {
//!     let identity = NodeIdentity::master(0x01).unwrap();
//!     BUS.init(regs, identity, &BusConfig::default(), &STORAGE)
//! }
//!
//! #[interrupt]
//! fn CAN0() {
//!     BUS.on_interrupt();
//! }
//! ```
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use super::InternalBus;
use crate::{
    config::BusConfig,
    core::{Payload, SlotIndex},
    error::{InitFailure, SendError},
    infra::registers::BusRegisters,
    protocol::{
        configurator::power_up,
        dispatcher::Dispatch,
        identity::{NodeId, NodeIdentity},
        storage::NodeStorage,
    },
};

/// Interrupt-safe home of an [`InternalBus`], usable as a `static`.
pub struct SharedBus<'a, R: BusRegisters> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<InternalBus<'a, R>>>>,
}

impl<'a, R: BusRegisters> SharedBus<'a, R> {
    /// Empty binding. [`init`](Self::init) must run before any operation.
    pub const fn uninit() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Bring the node up and install it.
    ///
    /// The readiness wait runs outside the critical section. Everything from
    /// the controller reset to installing the bus runs inside it, so an
    /// interrupt raised as soon as the controller is enabled is serviced only
    /// once the bus is complete. On failure the register interface comes back
    /// inside [`InitFailure`] and nothing is installed.
    pub fn init(
        &self,
        mut regs: R,
        identity: NodeIdentity,
        config: &BusConfig,
        storage: &'a NodeStorage,
    ) -> Result<(), InitFailure<R>> {
        if let Err(error) = power_up(&mut regs, config) {
            return Err(InitFailure::new(error, regs));
        }
        self.inner.lock(|cell| {
            *cell.borrow_mut() = Some(InternalBus::start(regs, identity, config, storage));
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Run `f` on the bus inside the critical section.
    pub fn with<T>(&self, f: impl FnOnce(&mut InternalBus<'a, R>) -> T) -> Result<T, SendError> {
        self.inner.lock(|cell| {
            let mut guard = cell.borrow_mut();
            let bus = guard.as_mut().ok_or(SendError::NotInitialized)?;
            Ok(f(bus))
        })
    }

    /// Remove the bus, handing back ownership of its state.
    pub fn take(&self) -> Option<InternalBus<'a, R>> {
        self.inner.lock(|cell| cell.take())
    }

    /// Interrupt vector entry. Does nothing before initialization.
    pub fn on_interrupt(&self) -> Dispatch {
        self.with(|bus| bus.on_interrupt()).unwrap_or(Dispatch::Idle)
    }

    /// See [`InternalBus::command_slave`].
    pub fn command_slave(&self, target: NodeId, data: Payload) -> Result<SlotIndex, SendError> {
        self.with(|bus| bus.command_slave(target, data))?
    }

    /// See [`InternalBus::request_slave`].
    pub fn request_slave(&self, target: NodeId) -> Result<SlotIndex, SendError> {
        self.with(|bus| bus.request_slave(target))?
    }

    /// See [`InternalBus::abandon_request`].
    pub fn abandon_request(&self) -> Result<Option<NodeId>, SendError> {
        self.with(|bus| bus.abandon_request())
    }

    /// See [`InternalBus::send_to_master`].
    pub fn send_to_master(&self, data: Payload) -> Result<SlotIndex, SendError> {
        self.with(|bus| bus.send_to_master(data))?
    }

    /// See [`InternalBus::publish_response`].
    pub fn publish_response(&self, data: Payload) -> Result<(), SendError> {
        self.with(|bus| bus.publish_response(data))?
    }

    /// See [`InternalBus::is_pending`].
    pub fn is_pending(&self, slot: SlotIndex) -> Result<bool, SendError> {
        self.with(|bus| bus.is_pending(slot))
    }
}

impl<'a, R: BusRegisters> Default for SharedBus<'a, R> {
    fn default() -> Self {
        Self::uninit()
    }
}
