//! Flash subsystem contract
//!
//! The generic NAND layer (ECC, bad blocks, read/program/erase sequencing,
//! partition devices) lives in the host environment. This trait is the part
//! of its API the static bus controller consumes.

use core::fmt;

use crate::chip::ChipBlock;
use crate::partition::PartitionTable;

/// A chip the subsystem refused to take, handed back to the caller
pub struct ScanRejected<T> {
    /// The chip, untouched ownership-wise
    pub chip: ChipBlock<T>,
    /// Why the scan failed
    pub reason: &'static str,
}

impl<T> fmt::Debug for ScanRejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRejected")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Failure reported by a subsystem entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemFault {
    /// Why the call failed
    pub reason: &'static str,
}

impl fmt::Display for SubsystemFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason)
    }
}

/// Entry points of the external flash subsystem
///
/// `scan` takes ownership of the chip; from then on the subsystem is the only
/// party allowed to drive its transport. The returned [`Device`](Self::Device)
/// is a non-owning handle used to address the chip in later calls.
pub trait FlashSubsystem {
    /// Transport of the chips this subsystem drives
    type Transport;

    /// Non-owning reference to a scanned chip
    type Device: Copy + fmt::Debug;

    /// Identify the chip and take ownership of it
    ///
    /// `autodetect_bus_width` asks the subsystem to work out the bus width
    /// from the chip's ID instead of assuming 8 bits.
    fn scan(
        &mut self,
        chip: ChipBlock<Self::Transport>,
        autodetect_bus_width: bool,
    ) -> Result<Self::Device, ScanRejected<Self::Transport>>;

    /// Register the partition devices for a scanned chip
    fn register_partitions(
        &mut self,
        device: Self::Device,
        partitions: &PartitionTable,
    ) -> Result<(), SubsystemFault>;

    /// Remove the partition devices of a chip
    fn unregister(&mut self, device: Self::Device);

    /// Release a scanned chip and hand its block back
    ///
    /// Returns `None` if the device is unknown.
    fn release(&mut self, device: Self::Device) -> Option<ChipBlock<Self::Transport>>;
}
