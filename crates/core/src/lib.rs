//! Domain types and pure scheduling logic for the Dentiro clinic service.
//!
//! Nothing in this crate performs I/O. The current instant is always passed
//! in by the caller so every function here is deterministic.

pub mod availability;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod timezone;
