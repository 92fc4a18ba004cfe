//! Chip abstraction handed to the flash subsystem
//!
//! The controller fills in a [`NandChip`] once (transport, timing hint, ECC
//! strategy) and then gives up ownership of it. The block it lives in comes
//! from a [`ChipAllocator`], so attach can fail cleanly before touching any
//! hardware.

use alloc::boxed::Box;
use core::ops::{Deref, DerefMut};

use crate::error::Result;

/// ECC strategy the subsystem should use for this chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EccMode {
    /// No ECC
    None,
    /// ECC computed in software by the subsystem
    #[default]
    Soft,
}

/// Everything the subsystem needs to drive one chip
#[derive(Debug)]
pub struct NandChip<T> {
    /// Byte-level transport (strobe callback plus data register)
    pub transport: T,
    /// Delay hint after a read command, in milliseconds
    pub chip_delay_ms: u32,
    /// ECC strategy
    pub ecc_mode: EccMode,
}

impl<T> NandChip<T> {
    /// Create a chip with a zero delay hint and software ECC
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            chip_delay_ms: 0,
            ecc_mode: EccMode::Soft,
        }
    }
}

/// Owned allocation holding a [`NandChip`]
#[derive(Debug)]
pub struct ChipBlock<T>(Box<NandChip<T>>);

impl<T> ChipBlock<T> {
    /// Wrap an already allocated chip
    pub fn from_box(chip: Box<NandChip<T>>) -> Self {
        Self(chip)
    }

    /// Unwrap into the underlying allocation
    pub fn into_box(self) -> Box<NandChip<T>> {
        self.0
    }
}

impl<T> Deref for ChipBlock<T> {
    type Target = NandChip<T>;

    fn deref(&self) -> &NandChip<T> {
        &self.0
    }
}

impl<T> DerefMut for ChipBlock<T> {
    fn deref_mut(&mut self) -> &mut NandChip<T> {
        &mut self.0
    }
}

/// Source of chip blocks
///
/// Every block handed out by [`allocate`](Self::allocate) is given back
/// through [`free`](Self::free) exactly once.
pub trait ChipAllocator {
    /// Allocate a block holding `chip`
    ///
    /// Fails with [`Error::AllocationFailure`](crate::Error::AllocationFailure).
    fn allocate<T>(&mut self, chip: NandChip<T>) -> Result<ChipBlock<T>>;

    /// Return a block
    fn free<T>(&mut self, block: ChipBlock<T>);
}

/// Allocator backed by the global heap
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl ChipAllocator for HeapAllocator {
    fn allocate<T>(&mut self, chip: NandChip<T>) -> Result<ChipBlock<T>> {
        Ok(ChipBlock::from_box(Box::new(chip)))
    }

    fn free<T>(&mut self, block: ChipBlock<T>) {
        drop(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chip_uses_soft_ecc() {
        let chip = NandChip::new(());
        assert_eq!(chip.ecc_mode, EccMode::Soft);
        assert_eq!(chip.chip_delay_ms, 0);
    }

    #[test]
    fn test_heap_allocator_round_trip() {
        let mut alloc = HeapAllocator;
        let mut block = alloc.allocate(NandChip::new(7u8)).unwrap();
        block.chip_delay_ms = 25;
        assert_eq!(block.transport, 7);
        assert_eq!(block.chip_delay_ms, 25);
        alloc.free(block);
    }
}
