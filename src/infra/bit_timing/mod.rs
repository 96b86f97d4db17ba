//! CAN bit timing parameters and the resulting nominal bit rate.
//!
//! # Encoding
//!
//! `prop_phase1` and `phase2` hold the values written to the timing register,
//! i.e. the segment length minus one. A bit therefore spans
//!
//! ```text
//! 1 (sync) + (prop_phase1 + 1) + (phase2 + 1) quanta
//! ```
//!
//! and the nominal bit rate is `clock / ((prop_phase1 + phase2 + 3) * prescaler)`.
//! `sjw` is expressed directly in quanta.
use crate::error::TimingError;

/// Default internal bus clock feeding the controller (Hz).
pub const DEFAULT_CAN_CLOCK_HZ: u32 = 8_000_000;

/// Bit timing register contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Propagation + phase 1 segment, register encoding (1..=15).
    pub prop_phase1: u8,
    /// Phase 2 segment, register encoding (0..=7).
    pub phase2: u8,
    /// Synchronization jump width in quanta (1..=4).
    pub sjw: u8,
    /// Clock prescaler (1..=1024).
    pub prescaler: u16,
}

impl Default for BitTiming {
    /// 500 kbit/s from an 8 MHz clock.
    fn default() -> Self {
        Self::INTERNAL_BUS_500K
    }
}

impl BitTiming {
    /// Timing used on the internal lighting bus: 500 kbit/s at 8 MHz.
    pub const INTERNAL_BUS_500K: BitTiming = BitTiming {
        prop_phase1: 4,
        phase2: 1,
        sjw: 4,
        prescaler: 2,
    };

    /// Build a timing record. Call [`validate`](Self::validate) before use.
    pub const fn new(prop_phase1: u8, phase2: u8, sjw: u8, prescaler: u16) -> Self {
        Self {
            prop_phase1,
            phase2,
            sjw,
            prescaler,
        }
    }

    /// Number of time quanta in one bit.
    #[inline]
    pub const fn quanta_per_bit(&self) -> u32 {
        1 + (self.prop_phase1 as u32 + 1) + (self.phase2 as u32 + 1)
    }

    /// Nominal bit rate for the given controller clock.
    pub const fn bit_rate(&self, clock_hz: u32) -> u32 {
        let divisor = self.quanta_per_bit() * self.prescaler as u32;
        if divisor == 0 {
            0
        } else {
            clock_hz / divisor
        }
    }

    /// Check every field against the register ranges.
    pub fn validate(&self) -> Result<(), TimingError> {
        if !(1..=15).contains(&self.prop_phase1) {
            return Err(TimingError::PropPhase1OutOfRange {
                value: self.prop_phase1,
            });
        }
        if self.phase2 > 7 {
            return Err(TimingError::Phase2OutOfRange { value: self.phase2 });
        }
        if !(1..=4).contains(&self.sjw) {
            return Err(TimingError::SjwOutOfRange { value: self.sjw });
        }
        if !(1..=1024).contains(&self.prescaler) {
            return Err(TimingError::PrescalerOutOfRange {
                value: self.prescaler,
            });
        }
        Ok(())
    }
}
