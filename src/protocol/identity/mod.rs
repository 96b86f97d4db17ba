//! 29-bit node identifiers and the master/slave discriminator convention.
//!
//! # Identifier allocation
//!
//! ```text
//! Bit 0 (DISCRIMINATOR_BIT) : 1 = master, 0 = slave
//! Bits 1-28                 : free for the deployment (lower value wins arbitration)
//! ```
//!
//! The master's filtered receive object accepts any identifier with bit 0
//! clear. A master id with the bit clear would make the master receive its own
//! traffic, and a slave id with the bit set would never reach the master, so
//! both are rejected at construction.
use crate::core::{NodeRole, DISCRIMINATOR_BIT, MAX_EXTENDED_ID};
use crate::error::IdentityError;
use embedded_can::ExtendedId;

//==================================================================================NODE_ID
/// Extended (29-bit) identifier of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(ExtendedId);

impl NodeId {
    /// Wrap any 29-bit value, without checking the role convention.
    pub fn new(raw: u32) -> Result<Self, IdentityError> {
        ExtendedId::new(raw)
            .map(Self)
            .ok_or(IdentityError::OutOfRange { raw })
    }

    /// Identifier valid for the master role (discriminator bit set).
    pub fn master(raw: u32) -> Result<Self, IdentityError> {
        let id = Self::new(raw)?;
        if id.is_master_id() {
            Ok(id)
        } else {
            Err(IdentityError::MasterDiscriminatorClear { raw })
        }
    }

    /// Identifier valid for a slave (discriminator bit clear).
    pub fn slave(raw: u32) -> Result<Self, IdentityError> {
        let id = Self::new(raw)?;
        if id.is_master_id() {
            Err(IdentityError::SlaveDiscriminatorSet { raw })
        } else {
            Ok(id)
        }
    }

    /// Raw 29-bit value.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0.as_raw()
    }

    /// Underlying `embedded-can` identifier.
    #[inline]
    pub fn as_extended(&self) -> ExtendedId {
        self.0
    }

    /// Whether the discriminator bit is set.
    #[inline]
    pub fn is_master_id(&self) -> bool {
        self.raw() & DISCRIMINATOR_BIT != 0
    }

    /// Role implied by the discriminator bit.
    pub fn implied_role(&self) -> NodeRole {
        if self.is_master_id() {
            NodeRole::Master
        } else {
            NodeRole::Slave
        }
    }

    /// Whether `self` wins arbitration against `other` (lower value wins).
    #[inline]
    pub fn wins_arbitration_over(&self, other: &NodeId) -> bool {
        self.raw() < other.raw()
    }
}

impl From<NodeId> for ExtendedId {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<NodeId> for embedded_can::Id {
    fn from(value: NodeId) -> Self {
        embedded_can::Id::Extended(value.0)
    }
}

impl TryFrom<u32> for NodeId {
    type Error = IdentityError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NodeId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "NodeId({=u32:#x})", self.raw())
    }
}

//==================================================================================NODE_IDENTITY
/// Identifier and role of the local node. Set once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeIdentity {
    id: NodeId,
    role: NodeRole,
}

impl NodeIdentity {
    /// Identity of the bus master.
    pub fn master(raw: u32) -> Result<Self, IdentityError> {
        Ok(Self {
            id: NodeId::master(raw)?,
            role: NodeRole::Master,
        })
    }

    /// Identity of a slave node.
    pub fn slave(raw: u32) -> Result<Self, IdentityError> {
        Ok(Self {
            id: NodeId::slave(raw)?,
            role: NodeRole::Slave,
        })
    }

    /// Identity for an explicit role, checked against the convention.
    pub fn new(raw: u32, role: NodeRole) -> Result<Self, IdentityError> {
        match role {
            NodeRole::Master => Self::master(raw),
            NodeRole::Slave => Self::slave(raw),
        }
    }

    /// Identity whose role follows from the discriminator bit.
    pub fn from_id(raw: u32) -> Result<Self, IdentityError> {
        let id = NodeId::new(raw)?;
        Ok(Self {
            id,
            role: id.implied_role(),
        })
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn role(&self) -> NodeRole {
        self.role
    }
}

/// Largest identifier a slave may use.
pub const MAX_SLAVE_ID: u32 = MAX_EXTENDED_ID & !DISCRIMINATOR_BIT;
