//! Node bring-up: clock, readiness, bit timing, and the fixed message objects
//! of the node's role.
use crate::{
    config::BusConfig,
    core::NodeRole,
    error::{InitError, InitFailure},
    infra::registers::BusRegisters,
    protocol::{
        allocator::TxSlotAllocator, bus::InternalBus, identity::NodeIdentity,
        message_object::MessageObject, slots::SlotLayout, storage::NodeStorage,
    },
};

impl<'a, R: BusRegisters> InternalBus<'a, R> {
    /// Bring the controller up and install the role's fixed objects.
    ///
    /// Steps:
    /// 1. Validate the bit timing (nothing is touched on failure).
    /// 2. Enable the clock and poll for readiness at most
    ///    `config.ready_poll_limit` times.
    /// 3. Reset, program the timing, enable, set automatic retry, unmask
    ///    interrupts.
    /// 4. Install the fixed objects from the role table:
    ///    master → filtered receive from all slaves;
    ///    slave → auto-respond with the current remote buffer, then exact
    ///    receive of its own id.
    ///
    /// On failure the register interface comes back inside [`InitFailure`].
    pub fn initialize(
        mut regs: R,
        identity: NodeIdentity,
        config: &BusConfig,
        storage: &'a NodeStorage,
    ) -> Result<Self, InitFailure<R>> {
        match power_up(&mut regs, config) {
            Ok(()) => Ok(Self::start(regs, identity, config, storage)),
            Err(error) => Err(InitFailure::new(error, regs)),
        }
    }

    /// Steps 3 and 4 of [`initialize`](Self::initialize), on a peripheral
    /// already powered up.
    pub(crate) fn start(
        mut regs: R,
        identity: NodeIdentity,
        config: &BusConfig,
        storage: &'a NodeStorage,
    ) -> Self {
        regs.reset();
        regs.set_bit_timing(&config.timing);
        regs.enable();
        regs.set_auto_retry(config.auto_retry);
        regs.enable_interrupts();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Internal bus up: {} as {}, {=u32} bit/s",
            identity.id(),
            identity.role(),
            config.bit_rate()
        );

        let layout = SlotLayout::for_role(identity.role());
        let mut bus = Self {
            regs,
            identity,
            layout,
            allocator: TxSlotAllocator::new(&layout),
            storage,
            outstanding_request: None,
        };
        bus.install_role_objects();
        bus
    }

    fn install_role_objects(&mut self) {
        let own = self.identity.id();
        match self.identity.role() {
            NodeRole::Master => {
                let receive = self.layout.receive().slot;
                self.regs
                    .configure_object(receive, &MessageObject::receive_from_slaves());
            }
            NodeRole::Slave => {
                let respond = self.layout.auxiliary().slot;
                let data = self.storage.remote.load();
                self.regs
                    .configure_object(respond, &MessageObject::auto_respond(own, data));

                let receive = self.layout.receive().slot;
                self.regs
                    .configure_object(receive, &MessageObject::receive_exact(own));
            }
        }
    }
}

/// Steps 1 and 2 of bring-up: timing check, clock, bounded readiness wait.
/// Touches no interrupt-visible state.
pub(crate) fn power_up<R: BusRegisters>(regs: &mut R, config: &BusConfig) -> Result<(), InitError> {
    config.timing.validate()?;
    regs.enable_clock();
    wait_until_ready(regs, config.ready_poll_limit)
}

/// Poll readiness up to `limit` times.
fn wait_until_ready<R: BusRegisters>(regs: &mut R, limit: u32) -> Result<(), InitError> {
    let limit = limit.max(1);
    for _ in 0..limit {
        if regs.is_ready() {
            return Ok(());
        }
    }

    #[cfg(feature = "defmt")]
    defmt::error!("CAN peripheral not ready after {=u32} polls", limit);

    Err(InitError::HardwareNotReady { polls: limit })
}
