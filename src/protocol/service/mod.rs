//! Master polling service.
//!
//! Every period the master sends the current command buffer to one slave and,
//! optionally, asks that slave for its value. The loop runs in background
//! context and reaches the bus through [`SharedBus`], the same binding the
//! interrupt vector uses.
//!
//! ```rust,ignore
//! static STORAGE: NodeStorage = NodeStorage::new();
//! static BUS: SharedBus<'static, Can0Registers> = SharedBus::uninit();
//!
//! #[embassy_executor::task]
//! async fn poll() {
//!     let target = NodeId::slave(0x02).unwrap();
//!     let config = CadenceConfig::new(target).with_request_every(1);
//!     let result = MasterPoller::new(&BUS, EmbassyTimer, config).run().await;
//!     defmt::error!("polling stopped: {}", result);
//! }
//! ```
mod cadence;
mod timer;

pub use cadence::{CadenceConfig, CadenceStats, CommandCadence, Tick, DEFAULT_CADENCE_PERIOD};
pub use timer::BusTimer;

use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::{
    core::SlotIndex,
    error::SendError,
    infra::{registers::BusRegisters, status::ControllerStatus},
    protocol::{
        bus::SharedBus,
        storage::{BufferSnapshot, NodeStorage},
    },
};

/// Outcome of the optional request step of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestStep {
    Issued(SlotIndex),
    /// The previous request has not been answered yet.
    SkippedOutstanding,
}

/// What one [`MasterPoller::poll_once`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cycle {
    /// The period elapsed and the cycle ran.
    Ticked {
        tick: Tick,
        request: Option<RequestStep>,
        /// Remote buffer, when it changed since the previous cycle.
        remote: Option<BufferSnapshot>,
    },
    /// The dispatcher reported a controller fault before the period elapsed.
    /// The outstanding request was abandoned.
    Fault(ControllerStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollerStats {
    pub cycles: u32,
    pub requests: u32,
    pub requests_skipped: u32,
    pub faults: u32,
}

/// Periodic command/request loop of the master.
pub struct MasterPoller<'a, 'b, R: BusRegisters, T: BusTimer> {
    bus: &'a SharedBus<'b, R>,
    timer: T,
    config: CadenceConfig,
    cadence: CommandCadence,
    last_remote_sequence: u32,
    stats: PollerStats,
}

impl<'a, 'b, R: BusRegisters, T: BusTimer> MasterPoller<'a, 'b, R, T> {
    pub fn new(bus: &'a SharedBus<'b, R>, timer: T, config: CadenceConfig) -> Self {
        Self {
            bus,
            timer,
            cadence: CommandCadence::new(config.target),
            config,
            last_remote_sequence: 0,
            stats: PollerStats::default(),
        }
    }

    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    pub fn cadence(&self) -> &CommandCadence {
        &self.cadence
    }

    pub fn stats(&self) -> PollerStats {
        self.stats
    }

    /// Poll forever. Only errors the loop cannot recover from end it:
    /// a slave bus, an invalid target, or a bus that was never initialized.
    pub async fn run(mut self) -> Result<(), SendError> {
        loop {
            self.poll_once().await?;
        }
    }

    /// Wait one period (or for a controller fault) and run one cycle.
    pub async fn poll_once(&mut self) -> Result<Cycle, SendError> {
        let storage = self.bus.with(|bus| bus.storage())?;

        let fault = {
            let delay = self.timer.delay(self.config.period);
            let fault = storage.diagnostics.wait_status_fault();
            pin_mut!(delay);
            pin_mut!(fault);

            match select(delay, fault).await {
                Either::Left(((), _)) => None,
                Either::Right((status, _)) => Some(status),
            }
        };

        match fault {
            Some(status) => self.on_fault(status),
            None => self.cycle(storage),
        }
    }

    fn cycle(&mut self, storage: &NodeStorage) -> Result<Cycle, SendError> {
        self.stats.cycles = self.stats.cycles.wrapping_add(1);

        let payload = storage.command.load();
        let cadence = &mut self.cadence;
        let tick = self.bus.with(|bus| cadence.tick(bus, payload))??;

        let request = match self.config.request_every {
            Some(every) if self.stats.cycles.checked_rem(every) == Some(0) => Some(self.request()?),
            _ => None,
        };

        Ok(Cycle::Ticked {
            tick,
            request,
            remote: self.fresh_remote(storage),
        })
    }

    fn request(&mut self) -> Result<RequestStep, SendError> {
        let target = self.config.target;
        match self.bus.with(|bus| bus.request_slave(target))? {
            Ok(slot) => {
                self.stats.requests = self.stats.requests.wrapping_add(1);
                Ok(RequestStep::Issued(slot))
            }
            Err(SendError::RequestOutstanding { .. }) => {
                self.stats.requests_skipped = self.stats.requests_skipped.wrapping_add(1);
                Ok(RequestStep::SkippedOutstanding)
            }
            Err(err) => Err(err),
        }
    }

    fn fresh_remote(&mut self, storage: &NodeStorage) -> Option<BufferSnapshot> {
        let snapshot = storage.remote.snapshot();
        if snapshot.sequence == self.last_remote_sequence {
            return None;
        }
        self.last_remote_sequence = snapshot.sequence;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Remote data from {}: {=[u8]:#x}",
            self.config.target,
            &snapshot.data[..]
        );

        Some(snapshot)
    }

    fn on_fault(&mut self, status: ControllerStatus) -> Result<Cycle, SendError> {
        self.stats.faults = self.stats.faults.wrapping_add(1);
        self.bus.with(|bus| bus.abandon_request())?;
        self.cadence.reset();

        #[cfg(feature = "defmt")]
        defmt::warn!("Polling interrupted by controller fault: {}", status);

        Ok(Cycle::Fault(status))
    }
}
