//! Core types and algorithms for the mapstat regional-metric service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The interesting part lives in [`resolve`] and [`history`]: given raw
//! per-oblast and per-raion facts, compute the effective value shown for each
//! geographic unit, with raion rollups taking precedence over direct oblast
//! entries.

pub mod geo;
pub mod history;
pub mod layer;
pub mod resolve;
pub mod store;
pub mod value;
