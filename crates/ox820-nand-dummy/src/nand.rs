//! Simulated NAND chip behind the static chip select window

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use ox820_nand_core::bus::Mmio;
use ox820_nand_core::nand::{self, NandStatus};
use ox820_nand_core::Ox820Config;

use crate::sysctrl::CountingLock;

/// Parameter page contents served after `PARAMETER_PAGE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPage {
    bytes: Vec<u8>,
}

impl ParameterPage {
    /// Size of one ONFI parameter page copy
    pub const LEN: usize = 256;

    /// ONFI page advertising the given page read time (microseconds)
    pub fn onfi(t_r_us: u16) -> Self {
        let mut bytes = vec![0u8; Self::LEN];
        bytes[..4].copy_from_slice(&nand::param_page::ONFI_SIGNATURE);
        Self { bytes }.with_raw_page_read_time(t_r_us.to_le_bytes()[0], t_r_us.to_le_bytes()[1])
    }

    /// Overwrite the two t_R bytes as-is
    pub fn with_raw_page_read_time(mut self, low: u8, high: u8) -> Self {
        let at = nand::param_page::PAGE_READ_TIME_OFFSET;
        self.bytes[at] = low;
        self.bytes[at + 1] = high;
        self
    }

    /// Replace the signature
    pub fn with_signature(mut self, signature: [u8; 4]) -> Self {
        self.bytes[..4].copy_from_slice(&signature);
        self
    }

    /// Raw page bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Static description of the simulated chip
#[derive(Debug, Clone)]
pub struct SimNandConfig {
    /// Bytes returned after `READ_ID` and address 0x00
    pub id: [u8; 5],
    /// Parameter page
    pub parameter_page: ParameterPage,
    /// Status reads reporting busy after each `READ_STATUS`
    pub busy_reads: usize,
    /// Never report ready
    pub stuck_busy: bool,
    /// Window offset decoded as the address latch
    pub address_latch: usize,
    /// Window offset decoded as the command latch
    pub command_latch: usize,
}

impl Default for SimNandConfig {
    fn default() -> Self {
        let board = Ox820Config::default();
        Self {
            // Samsung K9F1G08U0D, 128 MiB x8
            id: [0xec, 0xf1, 0x00, 0x95, 0x40],
            parameter_page: ParameterPage::onfi(25_000),
            busy_reads: 0,
            stuck_busy: false,
            address_latch: board.address_latch,
            command_latch: board.command_latch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Idle,
    Status,
    Id,
    ParameterPage,
}

/// Everything the simulated chip observed
#[derive(Debug)]
pub struct SimNandState {
    config: SimNandConfig,
    output: Output,
    cursor: usize,
    busy_left: usize,
    /// Bytes strobed into the command latch, in order
    pub commands: Vec<u8>,
    /// Bytes strobed into the address latch, in order
    pub addresses: Vec<u8>,
    /// Bytes written to the data register
    pub data_writes: Vec<u8>,
    /// Number of reads from the data register
    pub data_reads: usize,
    /// Writes to offsets the chip does not decode
    pub stray_writes: Vec<(usize, u8)>,
    /// Reads and writes made while the configuration lock was held
    pub locked_accesses: usize,
}

impl SimNandState {
    /// Total number of byte writes seen on the window
    pub fn bus_writes(&self) -> usize {
        self.commands.len() + self.addresses.len() + self.data_writes.len() + self.stray_writes.len()
    }

    fn command(&mut self, cmd: u8) {
        self.commands.push(cmd);
        match cmd {
            nand::READ_STATUS => {
                self.output = Output::Status;
                self.busy_left = self.config.busy_reads;
            }
            nand::READ_ID => {
                self.output = Output::Id;
                self.cursor = 0;
            }
            nand::PARAMETER_PAGE => {
                self.output = Output::ParameterPage;
                self.cursor = 0;
            }
            // Returns to data output after a status poll
            nand::READ_CYCLE1 => {
                if self.output == Output::Status {
                    self.output = Output::ParameterPage;
                }
            }
            _ => self.output = Output::Idle,
        }
    }

    fn status(&mut self) -> u8 {
        if self.config.stuck_busy {
            return 0;
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return 0;
        }
        NandStatus::READY.bits()
    }

    fn read_data(&mut self) -> u8 {
        self.data_reads += 1;
        match self.output {
            Output::Idle => 0xff,
            Output::Status => self.status(),
            Output::Id => {
                let byte = self.config.id.get(self.cursor).copied().unwrap_or(0);
                self.cursor += 1;
                byte
            }
            Output::ParameterPage => {
                let page = self.config.parameter_page.as_bytes();
                let byte = page.get(self.cursor % page.len()).copied().unwrap_or(0xff);
                self.cursor += 1;
                byte
            }
        }
    }
}

/// Static chip select window with a NAND chip on it
///
/// Clones share the same chip, so a test can keep one while the other is
/// moved into the transport.
#[derive(Debug, Clone)]
pub struct SimNand {
    state: Rc<RefCell<SimNandState>>,
    lock_held: Rc<Cell<bool>>,
}

impl SimNand {
    /// Create a chip
    pub fn new(config: SimNandConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimNandState {
                config,
                output: Output::Idle,
                cursor: 0,
                busy_left: 0,
                commands: Vec::new(),
                addresses: Vec::new(),
                data_writes: Vec::new(),
                data_reads: 0,
                stray_writes: Vec::new(),
                locked_accesses: 0,
            })),
            lock_held: Rc::default(),
        }
    }

    /// Count accesses made while `lock` is held
    pub fn guarded_by(mut self, lock: &CountingLock) -> Self {
        self.lock_held = lock.held_flag();
        self
    }

    /// Borrow the state for an access, noting whether the lock is held
    fn access(&self) -> RefMut<'_, SimNandState> {
        let mut state = self.state.borrow_mut();
        if self.lock_held.get() {
            state.locked_accesses += 1;
        }
        state
    }

    /// Create a chip with the default ID and parameter page
    pub fn new_default() -> Self {
        Self::new(SimNandConfig::default())
    }

    /// Observed bus traffic
    pub fn state(&self) -> Ref<'_, SimNandState> {
        self.state.borrow()
    }
}

impl Mmio for SimNand {
    fn read8(&mut self, offset: usize) -> u8 {
        let mut state = self.access();
        if offset == 0 {
            state.read_data()
        } else {
            0xff
        }
    }

    fn write8(&mut self, offset: usize, value: u8) {
        let mut state = self.access();
        if offset == state.config.command_latch {
            state.command(value);
        } else if offset == state.config.address_latch {
            state.addresses.push(value);
            state.cursor = 0;
        } else if offset == 0 {
            state.data_writes.push(value);
        } else {
            log::warn!("Stray write {:#04x} at {:#x}", value, offset);
            state.stray_writes.push((offset, value));
        }
    }

    fn read32(&mut self, _offset: usize) -> u32 {
        self.access();
        0xffff_ffff
    }

    fn write32(&mut self, offset: usize, value: u32) {
        log::warn!("32-bit write {:#010x} at {:#x} on the NAND window", value, offset);
        self.access().stray_writes.push((offset, value as u8));
    }
}
