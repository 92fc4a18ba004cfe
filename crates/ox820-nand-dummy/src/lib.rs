//! ox820-nand-dummy - Simulated OX820 board for testing
//!
//! This crate provides in-memory stand-ins for everything the attach
//! sequence touches: the NAND chip on the static bus, the system controller
//! registers, the configuration lock, time, the chip allocator and the flash
//! subsystem. Every simulation shares its state between clones so tests can
//! inspect a piece after it has been moved into the transport.

mod mtd;
mod nand;
mod sysctrl;

pub use mtd::{DummyMtd, MtdDevice, MtdEvent, MtdFaults, TrackingAllocator};
pub use nand::{ParameterPage, SimNand, SimNandConfig, SimNandState};
pub use sysctrl::{CountingLock, RegWrite, SimClock, SimSysCtrl, SysCtrlState};

use ox820_nand_core::nand::StaticBusNand;

/// Transport type of a chip attached on the simulated board
pub type SimTransport = StaticBusNand<SimNand, SimClock>;
