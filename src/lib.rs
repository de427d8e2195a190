//! TrueTouch firmware library.
//!
//! Exposes the pure-logic modules for integration testing, fuzzing and
//! host-side tooling. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bits;
pub mod config;
pub mod error;
pub mod pins;
pub mod protocol;
pub mod scheduler;

// The adapter and driver trees compile on the host too; their ESP-IDF
// halves are behind cfg attributes inside.
pub mod adapters;
pub mod drivers;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
