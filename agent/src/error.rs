use core::ffi::c_int;

use ear_protocol::DistinguishedKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("invalid value for {0}: expected a non-empty path without NUL bytes")]
    InvalidOverrideValue(DistinguishedKey),

    #[error("out of memory while building the environment")]
    AllocationFailure,
}

impl EnvironmentError {
    /// errno reported to the caller of the intercepted function.
    pub fn errno(&self) -> c_int {
        match self {
            EnvironmentError::InvalidOverrideValue(_) => libc::EINVAL,
            EnvironmentError::AllocationFailure => libc::ENOMEM,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvironmentError>;
