//! Domain models for the rx-extract system.

mod prescription;

pub use prescription::*;
