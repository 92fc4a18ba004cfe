//! Simulated system controller, delay source and configuration lock

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use ox820_nand_core::bus::{Delay, HwConfigLock, Mmio};

/// One 32-bit register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    /// Register offset
    pub offset: usize,
    /// Value written
    pub value: u32,
    /// Whether the configuration lock was held at the time
    pub locked: bool,
}

/// Register file contents and write history
#[derive(Debug, Default)]
pub struct SysCtrlState {
    regs: HashMap<usize, u32>,
    /// Every 32-bit write, in order
    pub writes: Vec<RegWrite>,
}

impl SysCtrlState {
    /// Current value of a register
    pub fn reg(&self, offset: usize) -> u32 {
        self.regs.get(&offset).copied().unwrap_or(0)
    }
}

/// System controller register window
///
/// Registers are plain storage; set/clear semantics of the clock and reset
/// registers are not modelled.
#[derive(Debug, Clone, Default)]
pub struct SimSysCtrl {
    state: Rc<RefCell<SysCtrlState>>,
    lock_held: Rc<Cell<bool>>,
}

impl SimSysCtrl {
    /// Create a register file with all registers zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record writes against the state of `lock`
    pub fn guarded_by(lock: &CountingLock) -> Self {
        Self {
            state: Rc::default(),
            lock_held: lock.held_flag(),
        }
    }

    /// Preload a register
    pub fn set_reg(&self, offset: usize, value: u32) {
        self.state.borrow_mut().regs.insert(offset, value);
    }

    /// Register contents and write history
    pub fn state(&self) -> Ref<'_, SysCtrlState> {
        self.state.borrow()
    }
}

impl Mmio for SimSysCtrl {
    fn read8(&mut self, offset: usize) -> u8 {
        (self.read32(offset & !3) >> ((offset & 3) * 8)) as u8
    }

    fn write8(&mut self, offset: usize, value: u8) {
        log::warn!("8-bit write {:#04x} at {:#x} on the system controller", value, offset);
    }

    fn read32(&mut self, offset: usize) -> u32 {
        self.state.borrow().reg(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        let mut state = self.state.borrow_mut();
        state.regs.insert(offset, value);
        state.writes.push(RegWrite {
            offset,
            value,
            locked: self.lock_held.get(),
        });
    }
}

/// Lock that counts acquisitions
#[derive(Debug, Default)]
pub struct CountingLock {
    acquisitions: Cell<u32>,
    held: Rc<Cell<bool>>,
}

impl CountingLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the lock was taken
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions.get()
    }

    /// Check if the lock is currently held
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    pub(crate) fn held_flag(&self) -> Rc<Cell<bool>> {
        self.held.clone()
    }
}

impl HwConfigLock for CountingLock {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        assert!(!self.held.get(), "configuration lock taken recursively");
        self.acquisitions.set(self.acquisitions.get() + 1);
        self.held.set(true);
        let ret = f();
        self.held.set(false);
        ret
    }
}

/// Simulated time
///
/// Delays return immediately and only advance the clock. Clones share it.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    elapsed_us: Rc<Cell<u64>>,
    busy_waits: Rc<Cell<u32>>,
    sleeps: Rc<Cell<u32>>,
    locked_delays: Rc<Cell<u32>>,
    lock_held: Rc<Cell<bool>>,
}

impl SimClock {
    /// Start at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at zero, counting delays taken while `lock` is held
    pub fn guarded_by(lock: &CountingLock) -> Self {
        Self {
            lock_held: lock.held_flag(),
            ..Self::default()
        }
    }

    /// Delays taken with the configuration lock held
    pub fn locked_delays(&self) -> u32 {
        self.locked_delays.get()
    }

    fn note_lock(&self) {
        if self.lock_held.get() {
            self.locked_delays.set(self.locked_delays.get() + 1);
        }
    }

    /// Total simulated time, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us.get()
    }

    /// Number of busy-waits
    pub fn busy_waits(&self) -> u32 {
        self.busy_waits.get()
    }

    /// Number of sleeps
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Delay for SimClock {
    fn delay_us(&mut self, us: u32) {
        self.note_lock();
        self.busy_waits.set(self.busy_waits.get() + 1);
        self.elapsed_us.set(self.elapsed_us.get() + u64::from(us));
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.note_lock();
        self.sleeps.set(self.sleeps.get() + 1);
        self.elapsed_us.set(self.elapsed_us.get() + u64::from(ms) * 1000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_record_lock_state() {
        let lock = CountingLock::new();
        let mut regs = SimSysCtrl::guarded_by(&lock);
        regs.write32(0x10, 1);
        lock.with_lock(|| regs.write32(0x14, 2));

        let state = regs.state();
        assert_eq!(state.writes[0], RegWrite { offset: 0x10, value: 1, locked: false });
        assert_eq!(state.writes[1], RegWrite { offset: 0x14, value: 2, locked: true });
        assert_eq!(lock.acquisitions(), 1);
    }

    #[test]
    fn test_clock_accumulates() {
        let clock = SimClock::new();
        let mut delay = clock.clone();
        delay.delay_us(100);
        delay.sleep_ms(2);
        assert_eq!(clock.elapsed_us(), 2100);
        assert_eq!((clock.busy_waits(), clock.sleeps()), (1, 1));
    }

    #[test]
    fn test_clock_counts_delays_under_lock() {
        let lock = CountingLock::new();
        let clock = SimClock::guarded_by(&lock);
        let mut delay = clock.clone();
        delay.sleep_ms(1);
        lock.with_lock(|| delay.delay_us(10));
        assert_eq!(clock.locked_delays(), 1);
        assert!(!lock.is_held());
    }
}
