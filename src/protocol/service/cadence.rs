//! Periodic command transmission that never piles frames up in hardware.
use embassy_time::Duration;

use crate::{
    core::{Payload, SlotIndex},
    error::SendError,
    infra::registers::BusRegisters,
    protocol::{bus::InternalBus, identity::NodeId},
};

/// Polling period of the lighting master.
pub const DEFAULT_CADENCE_PERIOD: Duration = Duration::from_millis(1_000);

/// Parameters of the master polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CadenceConfig {
    /// Time between two cycles.
    pub period: Duration,
    /// Slave receiving the command (and the requests, if enabled).
    pub target: NodeId,
    /// Issue a remote request every N cycles. `None` disables requests.
    pub request_every: Option<u32>,
}

impl CadenceConfig {
    /// One command per second to `target`, no requests.
    pub fn new(target: NodeId) -> Self {
        Self {
            period: DEFAULT_CADENCE_PERIOD,
            target,
            request_every: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// `0` is treated as `None`.
    pub fn with_request_every(mut self, cycles: u32) -> Self {
        self.request_every = (cycles > 0).then_some(cycles);
        self
    }
}

/// Result of one cadence step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Command queued on this slot.
    Sent(SlotIndex),
    /// Previous command still pending on this slot: nothing queued.
    SkippedBusy(SlotIndex),
    /// No transient slot free: nothing queued.
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CadenceStats {
    pub sent: u32,
    pub skipped_busy: u32,
    pub backpressure: u32,
}

/// Sends one command per tick unless the previous one is still in flight.
#[derive(Debug, Clone)]
pub struct CommandCadence {
    target: NodeId,
    last_slot: Option<SlotIndex>,
    stats: CadenceStats,
}

impl CommandCadence {
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            last_slot: None,
            stats: CadenceStats::default(),
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn stats(&self) -> CadenceStats {
        self.stats
    }

    /// Slot used by the last command actually queued.
    pub fn last_slot(&self) -> Option<SlotIndex> {
        self.last_slot
    }

    /// Forget the previous slot, e.g. after the controller went bus-off.
    pub fn reset(&mut self) {
        self.last_slot = None;
    }

    /// Queue `payload` for the target unless the previous command is pending.
    ///
    /// Backpressure is a normal outcome, not an error. Any other encoder error
    /// is returned unchanged.
    pub fn tick<R: BusRegisters>(
        &mut self,
        bus: &mut InternalBus<'_, R>,
        payload: Payload,
    ) -> Result<Tick, SendError> {
        if let Some(slot) = self.last_slot {
            if bus.is_pending(slot) {
                self.stats.skipped_busy = self.stats.skipped_busy.wrapping_add(1);

                #[cfg(feature = "defmt")]
                defmt::debug!("Previous command still pending on slot {}", slot);

                return Ok(Tick::SkippedBusy(slot));
            }
        }

        match bus.command_slave(self.target, payload) {
            Ok(slot) => {
                self.last_slot = Some(slot);
                self.stats.sent = self.stats.sent.wrapping_add(1);
                Ok(Tick::Sent(slot))
            }
            Err(SendError::BusAllocationExhausted) => {
                self.stats.backpressure = self.stats.backpressure.wrapping_add(1);

                #[cfg(feature = "defmt")]
                defmt::warn!("No free transmit slot, command dropped this cycle");

                Ok(Tick::Backpressure)
            }
            Err(err) => Err(err),
        }
    }
}
