//! Bus access traits
//!
//! These traits are the seams between the NAND transport and the hardware it
//! runs on. A real board backs them with mapped physical memory; tests back
//! them with simulations.

/// Memory-mapped register window
///
/// Offsets are relative to the start of the window. Reads take `&mut self`
/// because a read from a NAND data register advances the chip's internal
/// column pointer.
pub trait Mmio {
    /// Read an 8-bit value
    fn read8(&mut self, offset: usize) -> u8;

    /// Write an 8-bit value
    fn write8(&mut self, offset: usize, value: u8);

    /// Read a 32-bit value
    fn read32(&mut self, offset: usize) -> u32;

    /// Write a 32-bit value
    fn write32(&mut self, offset: usize, value: u32);
}

impl<M: Mmio + ?Sized> Mmio for &mut M {
    fn read8(&mut self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    fn write8(&mut self, offset: usize, value: u8) {
        (**self).write8(offset, value)
    }

    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Blocking delays used while waiting for the chip
///
/// `delay_us` is a short busy-wait, `sleep_ms` may yield the CPU.
pub trait Delay {
    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Sleep for the given number of milliseconds
    fn sleep_ms(&mut self, ms: u32);
}

/// Lock guarding the SoC's shared hardware configuration registers
///
/// The pin multiplexing register is shared with unrelated peripheral
/// drivers. The closure runs with the lock held and must not sleep or touch
/// the NAND bus.
pub trait HwConfigLock {
    /// Run `f` with the lock held
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// Delay backed by the host clock
///
/// `delay_us` spins on [`std::time::Instant`]; `sleep_ms` yields the thread.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_us(&mut self, us: u32) {
        let deadline = std::time::Duration::from_micros(u64::from(us));
        let start = std::time::Instant::now();
        while start.elapsed() < deadline {
            core::hint::spin_loop();
        }
    }

    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(feature = "std")]
impl HwConfigLock for std::sync::Mutex<()> {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        // A poisoned lock still serialises access; the guarded data is ().
        let _guard = self.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }
}
