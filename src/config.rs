//! Bring-up configuration of the internal bus.
use crate::infra::bit_timing::{BitTiming, DEFAULT_CAN_CLOCK_HZ};

/// Default number of readiness polls after enabling the peripheral clock.
///
/// The peripheral is normally ready within a handful of bus cycles; the budget
/// only exists so a dead peripheral fails bring-up instead of hanging it.
pub const DEFAULT_READY_POLL_LIMIT: u32 = 1_000;

/// Parameters used by [`InternalBus::initialize`](crate::protocol::bus::InternalBus::initialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Bit timing programmed into the controller.
    pub timing: BitTiming,
    /// Clock feeding the controller (Hz), used to report the resulting bit rate.
    pub clock_hz: u32,
    /// Maximum number of readiness polls before giving up.
    pub ready_poll_limit: u32,
    /// Automatic retransmission after errors or lost arbitration.
    pub auto_retry: bool,
}

impl Default for BusConfig {
    /// Internal lighting bus: 500 kbit/s from 8 MHz, automatic retry.
    fn default() -> Self {
        Self {
            timing: BitTiming::INTERNAL_BUS_500K,
            clock_hz: DEFAULT_CAN_CLOCK_HZ,
            ready_poll_limit: DEFAULT_READY_POLL_LIMIT,
            auto_retry: true,
        }
    }
}

impl BusConfig {
    pub fn with_timing(mut self, timing: BitTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// A limit of 0 is raised to 1: the peripheral is always polled at least once.
    pub fn with_ready_poll_limit(mut self, limit: u32) -> Self {
        self.ready_poll_limit = limit.max(1);
        self
    }

    pub fn with_auto_retry(mut self, enabled: bool) -> Self {
        self.auto_retry = enabled;
        self
    }

    /// Nominal bit rate this configuration yields.
    pub fn bit_rate(&self) -> u32 {
        self.timing.bit_rate(self.clock_hz)
    }
}
