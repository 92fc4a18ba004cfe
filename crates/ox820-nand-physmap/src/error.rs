//! Error types for physical memory access

use ox820_nand_core::config::ConfigError;
use thiserror::Error;

/// Errors raised while mapping the OX820 register windows
#[derive(Debug, Error)]
pub enum PhysmapError {
    /// Failed to open the physical memory device
    #[error("Failed to open /dev/mem: {0}")]
    OpenFailed(#[source] std::io::Error),

    /// mmap of a physical range failed
    #[error("Failed to map {size:#x} bytes at {address:#x}: {source}")]
    MapFailed {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// The board configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Physical memory access is not available on this platform
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

/// Result type for physical memory access
pub type Result<T> = std::result::Result<T, PhysmapError>;
