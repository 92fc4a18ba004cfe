//! ox820-nand - OX820 static bus NAND driver
//!
//! Host-side entry points for the NAND chip on the Pogoplug Series 3. The
//! bus-level work lives in [`ox820_nand_core`]; this crate wraps it in a
//! load/unload lifecycle that keeps at most one controller attached.
//!
//! # Features
//!
//! - `physmap` - Map the real register windows through `/dev/mem`

pub mod error;
pub mod module;

pub use error::{ModuleError, Result};
pub use module::{bus_attached, NandModule};

pub use ox820_nand_core::{Error, Ox820Config};
