//! # Configuration Module
//!
//! Centralizes the compile-time tunables of the engine. Constants that the
//! on-disk format depends on are co-located here and tied to the layout
//! definitions through compile-time assertions, so a mismatch fails the
//! build instead of corrupting a database.

pub mod constants;

pub use constants::*;
