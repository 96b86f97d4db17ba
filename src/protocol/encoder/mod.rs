//! Outbound frame patterns: master command, master request, slave push, and
//! refresh of the slave's automatic answer.
use crate::{
    core::{NodeRole, Payload, SlotIndex},
    error::SendError,
    infra::registers::BusRegisters,
    protocol::{bus::InternalBus, identity::NodeId, message_object::MessageObject},
};

impl<'a, R: BusRegisters> InternalBus<'a, R> {
    /// Send a two-byte command to a slave from the lowest free transient slot.
    ///
    /// Returns the slot used; it becomes reusable once the hardware clears its
    /// pending bit. [`SendError::BusAllocationExhausted`] means every transient
    /// slot is still pending: nothing was sent.
    pub fn command_slave(&mut self, target: NodeId, data: Payload) -> Result<SlotIndex, SendError> {
        self.require_role(NodeRole::Master)?;
        let target = NodeId::slave(target.raw())?;

        let slot = self.claim_transient_slot()?;
        self.regs
            .configure_object(slot, &MessageObject::command(target, data));

        #[cfg(feature = "defmt")]
        defmt::debug!("Command {=[u8]:#x} → {} on slot {}", &data[..], target, slot);

        Ok(slot)
    }

    /// Ask a slave for its current value through the fixed request slot.
    ///
    /// Only one request can be outstanding: the request slot is reused for
    /// every request. While the previous slave has not answered, this fails
    /// with [`SendError::RequestOutstanding`] instead of overwriting it; see
    /// [`abandon_request`](Self::abandon_request). The answer lands in the
    /// remote buffer once the dispatcher drains it, and the slot is then
    /// invalidated.
    ///
    /// A push and an answer from the same slave are identical on the wire
    /// (same id, two data bytes). A push sent by the target while the request
    /// is outstanding is therefore taken as the answer and lands in the remote
    /// buffer; the actual answer then reaches the receive slot.
    pub fn request_slave(&mut self, target: NodeId) -> Result<SlotIndex, SendError> {
        self.require_role(NodeRole::Master)?;
        let target = NodeId::slave(target.raw())?;

        if let Some(previous) = self.outstanding_request {
            return Err(SendError::RequestOutstanding {
                target: previous.raw(),
            });
        }

        let slot = self.layout.auxiliary().slot;
        self.regs
            .configure_object(slot, &MessageObject::remote_request(target));
        self.outstanding_request = Some(target);

        #[cfg(feature = "defmt")]
        defmt::debug!("Request → {} on slot {}", target, slot);

        Ok(slot)
    }

    /// Give up on the outstanding request (e.g. the slave never answered).
    /// The request slot is invalidated, so a late answer or a later push from
    /// that slave reaches the receive slot instead.
    pub fn abandon_request(&mut self) -> Option<NodeId> {
        let abandoned = self.outstanding_request.take()?;
        self.regs.invalidate_object(self.layout.auxiliary().slot);

        #[cfg(feature = "defmt")]
        defmt::warn!("Abandoning request to {}", abandoned);

        Some(abandoned)
    }

    /// Push two bytes to the master, unsolicited, from the lowest free
    /// transient slot.
    pub fn send_to_master(&mut self, data: Payload) -> Result<SlotIndex, SendError> {
        self.require_role(NodeRole::Slave)?;
        let own = self.identity.id();

        let slot = self.claim_transient_slot()?;
        self.regs
            .configure_object(slot, &MessageObject::send_to_master(own, data));

        #[cfg(feature = "defmt")]
        defmt::debug!("Push {=[u8]:#x} → master on slot {}", &data[..], slot);

        Ok(slot)
    }

    /// Change the value this slave serves to remote requests.
    ///
    /// The controller answers from its own copy of the data, so the
    /// auto-respond object is reprogrammed along with the remote buffer.
    pub fn publish_response(&mut self, data: Payload) -> Result<(), SendError> {
        self.require_role(NodeRole::Slave)?;
        let own = self.identity.id();

        self.storage.remote.store(data);
        let slot = self.layout.auxiliary().slot;
        self.regs
            .configure_object(slot, &MessageObject::auto_respond(own, data));
        Ok(())
    }

    fn claim_transient_slot(&mut self) -> Result<SlotIndex, SendError> {
        self.allocator
            .find_available(&mut self.regs)
            .ok_or(SendError::BusAllocationExhausted)
    }

    fn require_role(&self, role: NodeRole) -> Result<(), SendError> {
        let own = self.identity.role();
        if own == role {
            Ok(())
        } else {
            Err(SendError::WrongRole { role: own })
        }
    }
}
