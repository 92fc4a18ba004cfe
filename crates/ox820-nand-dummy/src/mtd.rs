//! Minimal flash subsystem and chip allocators

use ox820_nand_core::chip::{ChipAllocator, ChipBlock, NandChip};
use ox820_nand_core::error::{Error, Result};
use ox820_nand_core::nand::{self, CtrlFlags, NandTransport};
use ox820_nand_core::partition::PartitionTable;
use ox820_nand_core::subsystem::{FlashSubsystem, ScanRejected, SubsystemFault};

/// Handle to a chip owned by [`DummyMtd`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MtdDevice(u32);

/// Subsystem entry point invoked, for ordering checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtdEvent {
    /// `scan` was called
    Scan {
        /// Whether the caller asked for bus width autodetection
        autodetect_bus_width: bool,
    },
    /// `register_partitions` was called
    Register(MtdDevice),
    /// `unregister` was called
    Unregister(MtdDevice),
    /// `release` was called
    Release(MtdDevice),
}

/// Failure injection
#[derive(Debug, Clone, Copy, Default)]
pub struct MtdFaults {
    /// Reject every scan
    pub scan: bool,
    /// Fail every partition registration
    pub register: bool,
}

struct Slot<T> {
    device: MtdDevice,
    chip: ChipBlock<T>,
    id: [u8; 2],
    partitions: Option<PartitionTable>,
}

/// Flash subsystem that identifies chips by their ID and tracks
/// registered partition tables
pub struct DummyMtd<T> {
    faults: MtdFaults,
    next_id: u32,
    slots: Vec<Slot<T>>,
    events: Vec<MtdEvent>,
}

impl<T> Default for DummyMtd<T> {
    fn default() -> Self {
        Self::new(MtdFaults::default())
    }
}

impl<T> DummyMtd<T> {
    /// Create a subsystem with the given failure injection
    pub fn new(faults: MtdFaults) -> Self {
        Self {
            faults,
            next_id: 0,
            slots: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Entry points invoked so far
    pub fn events(&self) -> &[MtdEvent] {
        &self.events
    }

    /// Number of chips the subsystem currently owns
    pub fn chip_count(&self) -> usize {
        self.slots.len()
    }

    /// Chip owned for `device`
    pub fn chip(&self, device: MtdDevice) -> Option<&NandChip<T>> {
        self.slot(device).map(|s| &*s.chip)
    }

    /// Manufacturer and device ID read during scan
    pub fn id(&self, device: MtdDevice) -> Option<[u8; 2]> {
        self.slot(device).map(|s| s.id)
    }

    /// Partition table registered for `device`
    pub fn partitions(&self, device: MtdDevice) -> Option<&PartitionTable> {
        self.slot(device).and_then(|s| s.partitions.as_ref())
    }

    fn slot(&self, device: MtdDevice) -> Option<&Slot<T>> {
        self.slots.iter().find(|s| s.device == device)
    }
}

impl<T: NandTransport> DummyMtd<T> {
    fn read_id(transport: &mut T) -> [u8; 2] {
        let ctrl = CtrlFlags::NCE | CtrlFlags::CTRL_CHANGE;
        transport.cmd_ctrl(Some(nand::READ_ID), ctrl | CtrlFlags::CLE);
        transport.cmd_ctrl(Some(0x00), ctrl | CtrlFlags::ALE);
        transport.cmd_ctrl(None, CtrlFlags::NCE);
        let mut id = [0u8; 2];
        transport.read_buf(&mut id);
        id
    }
}

impl<T: NandTransport> FlashSubsystem for DummyMtd<T> {
    type Transport = T;
    type Device = MtdDevice;

    fn scan(
        &mut self,
        mut chip: ChipBlock<T>,
        autodetect_bus_width: bool,
    ) -> core::result::Result<MtdDevice, ScanRejected<T>> {
        self.events.push(MtdEvent::Scan {
            autodetect_bus_width,
        });
        if self.faults.scan {
            return Err(ScanRejected {
                chip,
                reason: "scan failure injected",
            });
        }

        let id = Self::read_id(&mut chip.transport);
        if id[0] == 0x00 || id[0] == 0xff {
            return Err(ScanRejected {
                chip,
                reason: "no NAND device found",
            });
        }
        log::info!("NAND device: manufacturer {:#04x}, device {:#04x}", id[0], id[1]);

        let device = MtdDevice(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot {
            device,
            chip,
            id,
            partitions: None,
        });
        Ok(device)
    }

    fn register_partitions(
        &mut self,
        device: MtdDevice,
        partitions: &PartitionTable,
    ) -> core::result::Result<(), SubsystemFault> {
        self.events.push(MtdEvent::Register(device));
        if self.faults.register {
            return Err(SubsystemFault {
                reason: "registration failure injected",
            });
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.device == device)
            .ok_or(SubsystemFault {
                reason: "unknown device",
            })?;
        slot.partitions = Some(*partitions);
        Ok(())
    }

    fn unregister(&mut self, device: MtdDevice) {
        self.events.push(MtdEvent::Unregister(device));
        if let Some(slot) = self.slots.iter_mut().find(|s| s.device == device) {
            slot.partitions = None;
        }
    }

    fn release(&mut self, device: MtdDevice) -> Option<ChipBlock<T>> {
        self.events.push(MtdEvent::Release(device));
        let pos = self.slots.iter().position(|s| s.device == device)?;
        Some(self.slots.remove(pos).chip)
    }
}

/// Heap allocator that counts allocations and frees
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    fail: bool,
    allocated: usize,
    freed: usize,
}

impl TrackingAllocator {
    /// Allocator that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator that always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Blocks handed out
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Blocks given back
    pub fn freed(&self) -> usize {
        self.freed
    }

    /// Blocks still outstanding
    pub fn outstanding(&self) -> usize {
        self.allocated - self.freed
    }
}

impl ChipAllocator for TrackingAllocator {
    fn allocate<T>(&mut self, chip: NandChip<T>) -> Result<ChipBlock<T>> {
        if self.fail {
            return Err(Error::AllocationFailure);
        }
        self.allocated += 1;
        Ok(ChipBlock::from_box(Box::new(chip)))
    }

    fn free<T>(&mut self, block: ChipBlock<T>) {
        assert!(self.freed < self.allocated, "chip block freed twice");
        self.freed += 1;
        drop(block);
    }
}
