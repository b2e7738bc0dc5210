//! ear-intercept: real-symbol resolution for the ear agent.
//!
//! The agent exports functions named like libc's process-creation entry
//! points. This crate finds the implementations those exports shadow, so
//! the agent can forward to them without calling itself.

pub mod module;
pub mod real;
pub mod resolver;
pub mod types;

pub use module::environment;
pub use resolver::{get, resolve_next};
pub use types::{Primitive, ResolveError};
