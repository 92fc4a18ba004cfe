//! Attach sequencer
//!
//! One-shot bring-up of the NAND chip on the static bus:
//!
//! 1. Allocate the chip block
//! 2. Route the pins to the static bus, enable its clock, release its reset
//! 3. Reset the chip
//! 4. Read the page read time from the parameter page
//! 5. Hand the chip to the flash subsystem for scanning
//! 6. Register the partition table
//!
//! Failures in steps 5 and 6 unwind everything acquired so far. The ready
//! status after the reset and parameter page commands is not checked: a chip
//! that times out there is still handed to the subsystem, whose scan is the
//! real presence check.

use core::fmt;

use crate::bus::{Delay, HwConfigLock, Mmio};
use crate::chip::{ChipAllocator, EccMode, NandChip};
use crate::config::Ox820Config;
use crate::error::{Error, Result};
use crate::nand::{read_page_read_time, StaticBusNand};
use crate::partition::{PartitionTable, POGOPLUG_V3_PARTITIONS};
use crate::regs;
use crate::subsystem::FlashSubsystem;

/// Route the NAND pins to the static bus and bring the bus out of reset
///
/// The whole read-modify-write sequence runs under `lock`; nothing else
/// happens while it is held.
pub fn configure_pins<L, R>(config: &Ox820Config, lock: &L, sysctrl: &mut R)
where
    L: HwConfigLock + ?Sized,
    R: Mmio + ?Sized,
{
    lock.with_lock(|| {
        let secsel = sysctrl.read32(regs::SYSCTRL_MFA_SECSEL_CTRL);
        sysctrl.write32(regs::SYSCTRL_MFA_SECSEL_CTRL, secsel | config.pin_mask);
        sysctrl.write32(regs::SYS_CTRL_CKEN_SET_CTRL, 1 << config.cken_static_bit);
        sysctrl.write32(regs::SYS_CTRL_RSTEN_CLR_CTRL, 1 << config.rsten_static_bit);
    });
    log::debug!(
        "Static bus enabled: MFA_SECSEL |= {:#010x}, CKEN bit {}, RSTEN bit {}",
        config.pin_mask,
        config.cken_static_bit,
        config.rsten_static_bit
    );
}

/// Drives the attach sequence against injected dependencies
pub struct Sequencer<'a, L: ?Sized, A, S> {
    config: &'a Ox820Config,
    lock: &'a L,
    alloc: &'a mut A,
    subsystem: &'a mut S,
    partitions: PartitionTable,
}

impl<'a, L, A, S> Sequencer<'a, L, A, S>
where
    L: HwConfigLock + ?Sized,
    A: ChipAllocator,
{
    /// Create a sequencer registering the Pogoplug Series 3 partitions
    pub fn new(
        config: &'a Ox820Config,
        lock: &'a L,
        alloc: &'a mut A,
        subsystem: &'a mut S,
    ) -> Self {
        Self {
            config,
            lock,
            alloc,
            subsystem,
            partitions: POGOPLUG_V3_PARTITIONS,
        }
    }

    /// Register a different partition table
    pub fn with_partitions(mut self, partitions: PartitionTable) -> Self {
        self.partitions = partitions;
        self
    }

    /// Run the attach sequence
    ///
    /// `bus` is the static chip select window and moves into the chip
    /// transport; `sysctrl` is only used while configuring the pins.
    pub fn attach<B, R, D>(
        self,
        bus: B,
        sysctrl: &mut R,
        delay: D,
    ) -> Result<Controller<S::Device>>
    where
        B: Mmio,
        R: Mmio + ?Sized,
        D: Delay,
        S: FlashSubsystem<Transport = StaticBusNand<B, D>>,
    {
        let chip = NandChip::new(StaticBusNand::new(bus, delay, self.config));
        let mut block = self.alloc.allocate(chip).map_err(|e| {
            log::error!("Failed to allocate NAND controller: {}", e);
            e
        })?;

        configure_pins(self.config, self.lock, sysctrl);

        block.transport.reset();
        let _ = block.transport.wait_ready();

        let chip_delay_ms = read_page_read_time(&mut block.transport);
        block.chip_delay_ms = chip_delay_ms;
        block.ecc_mode = EccMode::Soft;

        let device = match self.subsystem.scan(block, true) {
            Ok(device) => device,
            Err(rejected) => {
                log::error!("NAND scan failed: {}", rejected.reason);
                self.alloc.free(rejected.chip);
                return Err(Error::ScanFailure);
            }
        };

        if let Err(fault) = self.subsystem.register_partitions(device, &self.partitions) {
            log::error!("Failed to register NAND partitions: {}", fault);
            match self.subsystem.release(device) {
                Some(block) => self.alloc.free(block),
                None => log::warn!("Flash subsystem lost track of {:?}", device),
            }
            return Err(Error::RegistrationFailure);
        }

        log::info!(
            "OX820 NAND attached as {:?} with {} partitions",
            device,
            self.partitions.len()
        );

        Ok(Controller {
            device,
            chip_delay_ms,
        })
    }
}

/// Live controller handle
///
/// Holds only a non-owning reference to the chip; the subsystem owns it
/// until [`detach`](Self::detach) takes it back.
pub struct Controller<Dev> {
    device: Dev,
    chip_delay_ms: u32,
}

impl<Dev: Copy + fmt::Debug> Controller<Dev> {
    /// Subsystem handle for the attached chip
    pub fn device(&self) -> Dev {
        self.device
    }

    /// Page read time decoded at attach, in milliseconds
    pub fn chip_delay_ms(&self) -> u32 {
        self.chip_delay_ms
    }

    /// Tear the controller down
    ///
    /// Unregisters the partitions, releases the chip from the subsystem and
    /// frees its block.
    pub fn detach<S, A>(self, subsystem: &mut S, alloc: &mut A)
    where
        S: FlashSubsystem<Device = Dev>,
        A: ChipAllocator,
    {
        subsystem.unregister(self.device);
        match subsystem.release(self.device) {
            Some(block) => alloc.free(block),
            None => log::warn!("Flash subsystem lost track of {:?}", self.device),
        }
        log::info!("OX820 NAND detached");
    }
}

impl<Dev: fmt::Debug> fmt::Debug for Controller<Dev> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("device", &self.device)
            .field("chip_delay_ms", &self.chip_delay_ms)
            .finish()
    }
}
