//! Raw NAND transport over the static bus
//!
//! This module contains the bus-level pieces the flash subsystem drives:
//!
//! - [`StaticBusNand`] - command/address strobes and data byte transfer
//! - ready polling via [`StaticBusNand::wait_ready`]
//! - the attach-time parameter page decode in [`param_page`]

pub mod opcodes;
pub mod param_page;
mod ready;
mod status;
mod transport;

pub use opcodes::*;
pub use param_page::read_page_read_time;
pub use ready::{READY_POLL_ATTEMPTS, READY_POLL_INTERVAL_MS, READY_SETTLE_US};
pub use status::{CtrlFlags, NandStatus};
pub use transport::{NandTransport, StaticBusNand};
