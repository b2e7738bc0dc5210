//! Common definitions shared between the ear agent and its supervisor.

pub mod env;
pub mod platform;

pub use env::{DistinguishedKey, LOG_ENV_VAR};
