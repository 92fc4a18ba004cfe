//! Bus strobe layer
//!
//! The NAND chip's control lines are wired to static bus address lines, so
//! selecting the command or address latch is a matter of picking the right
//! offset inside the chip select window. Every strobe is a single byte-wide
//! write; the layer performs no validation of the flags it is given.

use super::opcodes;
use super::status::CtrlFlags;
use crate::bus::{Delay, Mmio};
use crate::config::Ox820Config;
use crate::regs;

/// Transport contract the flash subsystem drives after scan
///
/// This is the Rust shape of the `cmd_ctrl`/`read_byte`/`write_byte`
/// callbacks a generic NAND layer expects from a bus-level controller.
pub trait NandTransport {
    /// Strobe a command or address byte
    ///
    /// `None` is the "no command" marker: only the control lines change and
    /// nothing is written to the bus.
    fn cmd_ctrl(&mut self, cmd: Option<u8>, ctrl: CtrlFlags);

    /// Read one byte from the data register
    fn read_byte(&mut self) -> u8;

    /// Write one byte to the data register
    fn write_byte(&mut self, value: u8);

    /// Read `buf.len()` bytes from the data register
    fn read_buf(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.read_byte();
        }
    }

    /// Write all of `buf` to the data register
    fn write_buf(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.write_byte(byte);
        }
    }

    /// Sample the ready/busy line, if one is wired
    ///
    /// The static bus has no R/B pin, so the default reports `None` and the
    /// subsystem falls back to status polling or `chip_delay`.
    fn dev_ready(&mut self) -> Option<bool> {
        None
    }
}

/// NAND chip on a static bus chip select
pub struct StaticBusNand<B, D> {
    /// Static chip select window; offset 0 is the data register
    bus: B,
    /// Delay provider for ready polling
    delay: D,
    /// Offset of the address latch
    address_latch: usize,
    /// Offset of the command latch
    command_latch: usize,
}

impl<B: Mmio, D: Delay> StaticBusNand<B, D> {
    /// Create a transport over `bus` using the latch offsets in `config`
    pub fn new(bus: B, delay: D, config: &Ox820Config) -> Self {
        Self {
            bus,
            delay,
            address_latch: config.address_latch,
            command_latch: config.command_latch,
        }
    }

    /// Window offset selected by the given control flags
    ///
    /// CLE wins over ALE; with neither set the data register is addressed.
    pub fn latch_offset(&self, ctrl: CtrlFlags) -> usize {
        if ctrl.contains(CtrlFlags::CLE) {
            self.command_latch
        } else if ctrl.contains(CtrlFlags::ALE) {
            self.address_latch
        } else {
            regs::NAND_DATA
        }
    }

    /// Write `value` to the latch selected by `ctrl`
    pub fn strobe(&mut self, value: u8, ctrl: CtrlFlags) {
        let offset = self.latch_offset(ctrl);
        self.bus.write8(offset, value);
    }

    /// Strobe a command byte into the command latch
    pub fn write_command(&mut self, cmd: u8) {
        self.strobe(cmd, CtrlFlags::CLE);
    }

    /// Strobe an address byte into the address latch
    pub fn write_address(&mut self, addr: u8) {
        self.strobe(addr, CtrlFlags::ALE);
    }

    /// Issue a chip reset
    pub fn reset(&mut self) {
        self.write_command(opcodes::RESET);
    }

    pub(crate) fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Give back the bus window and delay provider
    pub fn into_parts(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B: Mmio, D: Delay> NandTransport for StaticBusNand<B, D> {
    fn cmd_ctrl(&mut self, cmd: Option<u8>, ctrl: CtrlFlags) {
        if let Some(cmd) = cmd {
            self.strobe(cmd, ctrl);
        }
    }

    fn read_byte(&mut self) -> u8 {
        self.bus.read8(regs::NAND_DATA)
    }

    fn write_byte(&mut self, value: u8) {
        self.bus.write8(regs::NAND_DATA, value);
    }
}
