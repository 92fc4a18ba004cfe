//! ox820-nand-core - Static-bus NAND transport for the OX820 SoC
//!
//! This crate provides the primitive byte-level transport a generic NAND
//! flash subsystem needs to drive a raw NAND chip hanging off the OX820
//! static memory bus (chip select 0), plus the one-shot attach sequence that
//! makes the chip reachable and hands it over to that subsystem.
//!
//! It is designed to be `no_std` compatible. Everything that moves the chip
//! abstraction across the subsystem boundary needs `alloc`.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), TOML
//!   configuration loading and std-backed delay/lock implementations
//! - `alloc` - Enable the chip abstraction, subsystem handoff and attach
//!   sequencer
//!
//! # Example
//!
//! ```ignore
//! use ox820_nand_core::attach::Sequencer;
//! use ox820_nand_core::chip::HeapAllocator;
//! use ox820_nand_core::Ox820Config;
//!
//! let config = Ox820Config::default();
//! let mut alloc = HeapAllocator;
//! let controller = Sequencer::new(&config, &lock, &mut alloc, &mut mtd)
//!     .attach(bus, &mut sysctrl, delay)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "alloc")]
pub mod attach;
pub mod bus;
#[cfg(feature = "alloc")]
pub mod chip;
pub mod config;
pub mod error;
pub mod nand;
pub mod partition;
pub mod regs;
#[cfg(feature = "alloc")]
pub mod subsystem;

pub use config::Ox820Config;
pub use error::{Error, Result};
