//! `canlight` library: `no_std` master/slave communication layer for the
//! internal CAN bus of a distributed lighting controller. One master sends
//! two-byte commands to slaves and polls them with remote requests; slaves
//! answer automatically and may push data on their own.
//!
//! The crate runs against any message-object controller implementing
//! [`infra::registers::BusRegisters`], and shares state between background
//! code and the interrupt vector through critical sections only.
#![no_std]
//==================================================================================
/// Bring-up configuration (bit timing, readiness budget, retry policy).
pub mod config;
/// Protocol constants and the slot index type.
pub mod core;
/// Error types of bring-up, outbound operations and interrupt-side faults.
pub mod error;
/// Register capability, bit timing arithmetic and status decoding.
pub mod infra;
/// Identifiers, message objects, the bus context and its operations.
pub mod protocol;
//==================================================================================
