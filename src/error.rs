//! Error definitions shared across library modules.
//! Each type models one failure domain: bit timing, identifier convention,
//! node bring-up, outbound operations, and faults observed in interrupt context.
use crate::core::NodeRole;
use crate::infra::status::ControllerStatus;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bit timing parameters outside what the controller can be programmed with.
pub enum TimingError {
    /// Sync/propagation/phase-1 encoding must be within 1..=15.
    #[error("Propagation + phase 1 segment out of range: {value}")]
    PropPhase1OutOfRange { value: u8 },
    /// Phase-2 encoding must be within 0..=7.
    #[error("Phase 2 segment out of range: {value}")]
    Phase2OutOfRange { value: u8 },
    /// Synchronization jump width must be within 1..=4 quanta.
    #[error("Synchronization jump width out of range: {value}")]
    SjwOutOfRange { value: u8 },
    /// Prescaler must be within 1..=1024.
    #[error("Prescaler out of range: {value}")]
    PrescalerOutOfRange { value: u16 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Identifier values that break the 29-bit addressing convention.
pub enum IdentityError {
    /// Value does not fit in 29 bits.
    #[error("Identifier does not fit in 29 bits: {raw:#x}")]
    OutOfRange { raw: u32 },
    /// A master identifier must carry the discriminator bit.
    #[error("Master identifier has the discriminator bit clear: {raw:#x}")]
    MasterDiscriminatorClear { raw: u32 },
    /// A slave identifier must not carry the discriminator bit.
    #[error("Slave identifier has the discriminator bit set: {raw:#x}")]
    SlaveDiscriminatorSet { raw: u32 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures aborting node bring-up.
pub enum InitError {
    /// The peripheral never reported ready within the configured poll budget.
    #[error("Hardware not ready after {polls} polls")]
    HardwareNotReady { polls: u32 },
    /// Bit timing rejected before touching the hardware.
    #[error(transparent)]
    InvalidTiming(#[from] TimingError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors returned to the caller of an outbound operation.
pub enum SendError {
    /// Every transient transmit slot is pending: backpressure, retry later.
    #[error("No free transmit message object")]
    BusAllocationExhausted,
    /// The fixed request slot still waits for the answer of a previous request.
    #[error("Request to {target:#x} still outstanding")]
    RequestOutstanding { target: u32 },
    /// Operation not available for this node's role.
    #[error("Operation not permitted for role {role:?}")]
    WrongRole { role: NodeRole },
    /// Target identifier violates the addressing convention.
    #[error(transparent)]
    InvalidTarget(#[from] IdentityError),
    /// The shared bus has not been initialized yet.
    #[error("Bus not initialized")]
    NotInitialized,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Anomalies recorded by the interrupt dispatcher. They are never propagated
/// out of interrupt context; background code reads them from
/// [`BusDiagnostics`](crate::protocol::storage::BusDiagnostics).
pub enum BusFault {
    /// Cause register held a value outside the defined set.
    #[error("Unexpected interrupt cause: {cause:#x}")]
    UnexpectedInterruptCause { cause: u32 },
    /// Controller reported bus-off or an error threshold.
    #[error("Controller status fault: {status:?}")]
    ControllerStatusFault { status: ControllerStatus },
}

/// Failed bring-up. Carries the register interface back so the caller can
/// retry with the same peripheral handle.
pub struct InitFailure<R> {
    error: InitError,
    regs: R,
}

impl<R> InitFailure<R> {
    pub(crate) fn new(error: InitError, regs: R) -> Self {
        Self { error, regs }
    }

    pub fn error(&self) -> InitError {
        self.error
    }

    /// Take the register interface back, dropping the error.
    pub fn release(self) -> R {
        self.regs
    }

    pub fn into_parts(self) -> (InitError, R) {
        (self.error, self.regs)
    }
}

impl<R> From<InitFailure<R>> for InitError {
    fn from(failure: InitFailure<R>) -> Self {
        failure.error
    }
}

impl<R> core::fmt::Debug for InitFailure<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InitFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<R> core::fmt::Display for InitFailure<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.error, f)
    }
}

#[cfg(feature = "defmt")]
impl<R> defmt::Format for InitFailure<R> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "InitFailure({})", self.error)
    }
}
