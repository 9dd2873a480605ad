//! DarkPulse: load an incident table, filter it, and derive the projections
//! the dashboard draws.
//!
//! The egui front-end lives in the `darkpulse` binary; this library holds
//! everything that does not need a window.

pub mod cache;
pub mod config;
pub mod data;
