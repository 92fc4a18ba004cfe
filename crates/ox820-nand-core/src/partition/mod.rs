//! Partition tables
//!
//! A partition is a named view over the flash's linear address space. The
//! subsystem registers each entry as an independent device, so entries are
//! allowed to overlap (a whole-device view next to its sub-regions, or a
//! primary copy next to a view that spans it).

mod pogoplug;
mod types;

pub use pogoplug::POGOPLUG_V3_PARTITIONS;
pub use types::*;
