//! Error types for ox820-nand-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The controller/chip block could not be allocated
    AllocationFailure,
    /// The flash subsystem did not recognise a chip on the bus
    ScanFailure,
    /// The flash subsystem refused the partition table
    RegistrationFailure,
    /// The chip never reported ready within the polling budget
    ReadyTimeout,
    /// A controller is already attached to the static bus
    AlreadyAttached,
}

impl Error {
    /// Negative status code for host environments that only understand
    /// integer returns.
    ///
    /// Callers must only test the value for non-zero; the mapping is not
    /// meant to be branched on.
    pub fn errno(&self) -> i32 {
        match self {
            Self::AllocationFailure => -12,
            Self::ScanFailure => -6,
            Self::RegistrationFailure => -23,
            Self::ReadyTimeout => -110,
            Self::AlreadyAttached => -16,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure => write!(f, "failed to allocate NAND controller"),
            Self::ScanFailure => write!(f, "no NAND device found on the static bus"),
            Self::RegistrationFailure => write!(f, "failed to register NAND partitions"),
            Self::ReadyTimeout => write!(f, "timeout waiting for NAND ready"),
            Self::AlreadyAttached => write!(f, "NAND controller already attached"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
