//! Message object configurations and the frames they exchange.
//!
//! A message object pairs an identifier, an acceptance filter, a direction and
//! two data bytes with a transmit, receive or auto-respond behavior. The
//! constructors below are the only patterns this protocol programs:
//!
//! | Constructor          | Kind          | Id     | Filter        |
//! |----------------------|---------------|--------|---------------|
//! | `command`            | Transmit      | slave  | exact         |
//! | `remote_request`     | RemoteRequest | slave  | exact         |
//! | `auto_respond`       | AutoRespond   | own    | exact         |
//! | `send_to_master`     | Transmit      | own    | exact         |
//! | `receive_from_slaves`| Receive       | 0      | discriminator |
//! | `receive_exact`      | Receive       | own    | exact         |
use crate::core::{Payload, DISCRIMINATOR_BIT, PAYLOAD_LEN};
use crate::protocol::identity::NodeId;
use embedded_can::{ExtendedId, Frame, Id};

//==================================================================================OBJECT_KIND
/// Direction and behavior of a configured message object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ObjectKind {
    /// Send one data frame.
    Transmit,
    /// Store matching data frames.
    Receive,
    /// Send a remote frame, then store the matching data frame sent in answer.
    RemoteRequest,
    /// Answer matching remote frames with the configured data, without CPU involvement.
    AutoRespond,
}

//==================================================================================ID_FILTER
/// Acceptance filter applied to incoming identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdFilter {
    /// Identifier must match exactly (mask register left at 0).
    Exact,
    /// Only bits set in the mask are compared.
    Masked(u32),
}

impl IdFilter {
    /// Mask value written to the mask register (0 = filtering disabled).
    pub const fn mask(&self) -> u32 {
        match self {
            IdFilter::Exact => 0,
            IdFilter::Masked(mask) => *mask,
        }
    }
}

//==================================================================================MESSAGE_OBJECT
/// Full configuration of one hardware message object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageObject {
    /// Arbitration identifier.
    pub id: ExtendedId,
    /// Acceptance filter (receive-side only).
    pub filter: IdFilter,
    /// Direction/behavior.
    pub kind: ObjectKind,
    /// Data length code; always [`PAYLOAD_LEN`] for this protocol.
    pub len: u8,
    /// Data to send (transmit and auto-respond objects).
    pub data: Payload,
    /// Raise an interrupt when this object finishes a transmission.
    pub tx_interrupt: bool,
    /// Raise an interrupt when this object stores a frame.
    pub rx_interrupt: bool,
}

impl MessageObject {
    /// Master → slave command, sent from a transient slot.
    pub fn command(target: NodeId, data: Payload) -> Self {
        Self::transmit(target, data)
    }

    /// Master → slave remote request. After sending, the object stores the
    /// slave's answer.
    pub fn remote_request(target: NodeId) -> Self {
        Self {
            id: target.as_extended(),
            filter: IdFilter::Exact,
            kind: ObjectKind::RemoteRequest,
            len: PAYLOAD_LEN as u8,
            data: [0; PAYLOAD_LEN],
            tx_interrupt: false,
            rx_interrupt: true,
        }
    }

    /// Slave answer to remote requests addressed to `own`.
    pub fn auto_respond(own: NodeId, data: Payload) -> Self {
        Self {
            id: own.as_extended(),
            filter: IdFilter::Exact,
            kind: ObjectKind::AutoRespond,
            len: PAYLOAD_LEN as u8,
            data,
            tx_interrupt: true,
            rx_interrupt: false,
        }
    }

    /// Slave → master unsolicited data, sent from a transient slot.
    pub fn send_to_master(own: NodeId, data: Payload) -> Self {
        Self::transmit(own, data)
    }

    /// Master receive object accepting every identifier with the
    /// discriminator bit clear.
    pub fn receive_from_slaves() -> Self {
        Self {
            id: ExtendedId::ZERO,
            filter: IdFilter::Masked(DISCRIMINATOR_BIT),
            kind: ObjectKind::Receive,
            len: PAYLOAD_LEN as u8,
            data: [0; PAYLOAD_LEN],
            tx_interrupt: false,
            rx_interrupt: true,
        }
    }

    /// Receive object accepting only `id`.
    pub fn receive_exact(id: NodeId) -> Self {
        Self {
            id: id.as_extended(),
            filter: IdFilter::Exact,
            kind: ObjectKind::Receive,
            len: PAYLOAD_LEN as u8,
            data: [0; PAYLOAD_LEN],
            tx_interrupt: false,
            rx_interrupt: true,
        }
    }

    fn transmit(id: NodeId, data: Payload) -> Self {
        Self {
            id: id.as_extended(),
            filter: IdFilter::Exact,
            kind: ObjectKind::Transmit,
            len: PAYLOAD_LEN as u8,
            data,
            tx_interrupt: true,
            rx_interrupt: false,
        }
    }

    /// Whether the acceptance filter lets `raw` through.
    pub fn accepts(&self, raw: u32) -> bool {
        let own = self.id.as_raw();
        match self.filter {
            IdFilter::Exact => raw == own,
            IdFilter::Masked(mask) => raw & mask == own & mask,
        }
    }

    /// Whether this object ever stores incoming data frames.
    pub fn is_receive_side(&self) -> bool {
        matches!(self.kind, ObjectKind::Receive | ObjectKind::RemoteRequest)
    }

    /// Frame this object puts on the wire when its transmission request is served.
    pub fn outgoing_frame(&self) -> Option<CanFrame> {
        match self.kind {
            ObjectKind::Transmit | ObjectKind::AutoRespond => {
                CanFrame::new(self.id, &self.data[..self.len as usize])
            }
            ObjectKind::RemoteRequest => CanFrame::new_remote(self.id, self.len as usize),
            ObjectKind::Receive => None,
        }
    }
}

//==================================================================================CAN_FRAME
/// CAN 2.0B extended frame as exchanged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// 29-bit identifier.
    pub id: ExtendedId,
    /// Payload buffer; only the first `len` bytes are meaningful.
    pub data: [u8; 8],
    /// Data Length Code (0 to 8).
    pub len: usize,
    /// Remote frame (no data, requests the owner of `id` to transmit).
    pub remote: bool,
}

impl CanFrame {
    /// Frame with no data, as returned by an empty message object.
    pub const fn empty(id: ExtendedId) -> Self {
        Self {
            id,
            data: [0; 8],
            len: 0,
            remote: false,
        }
    }

    /// The two protocol bytes, if the frame carries exactly that many.
    pub fn payload(&self) -> Option<Payload> {
        if self.remote || self.len != PAYLOAD_LEN {
            return None;
        }
        let mut out = [0u8; PAYLOAD_LEN];
        out.copy_from_slice(&self.data[..PAYLOAD_LEN]);
        Some(out)
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let Id::Extended(id) = id.into() else {
            return None;
        };
        if data.len() > 8 {
            return None;
        }
        let mut buffer = [0u8; 8];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            data: buffer,
            len: data.len(),
            remote: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        let Id::Extended(id) = id.into() else {
            return None;
        };
        if dlc > 8 {
            return None;
        }
        Some(Self {
            id,
            data: [0; 8],
            len: dlc,
            remote: true,
        })
    }

    fn is_extended(&self) -> bool {
        true
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        Id::Extended(self.id)
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.len]
        }
    }
}
