//! Error types for the host module

use thiserror::Error;

/// Errors returned when loading the module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The attach sequence failed
    #[error("NAND attach failed: {0}")]
    Nand(#[from] ox820_nand_core::Error),

    /// The hardware windows could not be mapped
    #[cfg(feature = "physmap")]
    #[error(transparent)]
    Physmap(#[from] ox820_nand_physmap::PhysmapError),
}

impl ModuleError {
    /// Negative errno equivalent, for hosts that report load status that way
    pub fn errno(&self) -> i32 {
        match self {
            Self::Nand(e) => e.errno(),
            #[cfg(feature = "physmap")]
            Self::Physmap(_) => -5, // EIO
        }
    }
}

/// Result type for module operations
pub type Result<T> = std::result::Result<T, ModuleError>;
