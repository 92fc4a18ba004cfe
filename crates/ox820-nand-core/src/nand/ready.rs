//! Ready polling
//!
//! The static bus has no ready/busy line, so readiness is observed through
//! the status register. The chip is frequently ready right after the status
//! command, so the first sample is taken before any delay.

use super::opcodes;
use super::status::NandStatus;
use super::transport::{NandTransport, StaticBusNand};
use crate::bus::{Delay, Mmio};
use crate::error::{Error, Result};

/// Busy-wait after a failed first sample, in microseconds
pub const READY_SETTLE_US: u32 = 100;
/// Number of slow polls before giving up
pub const READY_POLL_ATTEMPTS: u32 = 100;
/// Sleep between slow polls, in milliseconds
pub const READY_POLL_INTERVAL_MS: u32 = 1;

impl<B: Mmio, D: Delay> StaticBusNand<B, D> {
    /// Read the status register without issuing a command
    fn sample_status(&mut self) -> NandStatus {
        NandStatus::from_bits_retain(self.read_byte())
    }

    /// Issue READ STATUS and poll until the ready bit is set
    ///
    /// Returns `None` once the polling budget is exhausted.
    fn poll_ready(&mut self) -> Option<NandStatus> {
        self.write_command(opcodes::READ_STATUS);
        let status = self.sample_status();
        if status.is_ready() {
            return Some(status);
        }

        self.delay_mut().delay_us(READY_SETTLE_US);

        for _ in 0..READY_POLL_ATTEMPTS {
            let status = self.sample_status();
            if status.is_ready() {
                return Some(status);
            }
            self.delay_mut().sleep_ms(READY_POLL_INTERVAL_MS);
        }

        None
    }

    /// Wait for the chip to become ready and return its status
    ///
    /// On timeout this logs an error and returns [`NandStatus::FAIL`], which
    /// is indistinguishable from a failure reported by the chip itself.
    pub fn wait_ready(&mut self) -> NandStatus {
        match self.poll_ready() {
            Some(status) => status,
            None => {
                log::error!("OX820 NAND timeout waiting for ready");
                NandStatus::FAIL
            }
        }
    }

    /// Like [`wait_ready`](Self::wait_ready), but a timeout is an error
    pub fn wait_ready_checked(&mut self) -> Result<NandStatus> {
        self.poll_ready().ok_or_else(|| {
            log::error!("OX820 NAND timeout waiting for ready");
            Error::ReadyTimeout
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ox820Config;
    use std::vec::Vec;

    /// Status register that turns ready after a number of reads
    struct StatusBus {
        busy_reads: usize,
        reads: usize,
        writes: Vec<(usize, u8)>,
    }

    impl StatusBus {
        fn new(busy_reads: usize) -> Self {
            Self {
                busy_reads,
                reads: 0,
                writes: Vec::new(),
            }
        }
    }

    impl Mmio for StatusBus {
        fn read8(&mut self, _offset: usize) -> u8 {
            self.reads += 1;
            if self.reads > self.busy_reads {
                0xC0
            } else {
                0x80
            }
        }
        fn write8(&mut self, offset: usize, value: u8) {
            self.writes.push((offset, value));
        }
        fn read32(&mut self, _offset: usize) -> u32 {
            0
        }
        fn write32(&mut self, _offset: usize, _value: u32) {}
    }

    /// Clock that only accumulates requested delays
    #[derive(Default)]
    struct SimClock {
        elapsed_us: u64,
        busy_waits: u32,
        sleeps: u32,
    }

    impl Delay for SimClock {
        fn delay_us(&mut self, us: u32) {
            self.busy_waits += 1;
            self.elapsed_us += us as u64;
        }
        fn sleep_ms(&mut self, ms: u32) {
            self.sleeps += 1;
            self.elapsed_us += ms as u64 * 1000;
        }
    }

    fn polled(busy_reads: usize) -> StaticBusNand<StatusBus, SimClock> {
        StaticBusNand::new(
            StatusBus::new(busy_reads),
            SimClock::default(),
            &Ox820Config::default(),
        )
    }

    #[test]
    fn test_ready_on_first_sample_has_no_delay() {
        let mut nand = polled(0);
        let status = nand.wait_ready();
        assert!(status.is_ready());

        let (bus, clock) = nand.into_parts();
        assert_eq!(bus.writes, [(1 << 19, opcodes::READ_STATUS)]);
        assert_eq!(bus.reads, 1);
        assert_eq!(clock.elapsed_us, 0);
        assert_eq!(clock.busy_waits, 0);
    }

    #[test]
    fn test_ready_after_a_few_polls() {
        // First sample busy, then two busy slow polls, ready on the third
        let mut nand = polled(3);
        assert!(nand.wait_ready().is_ready());

        let (bus, clock) = nand.into_parts();
        assert_eq!(bus.reads, 4);
        assert_eq!(clock.busy_waits, 1);
        assert_eq!(clock.sleeps, 2);
        assert_eq!(clock.elapsed_us, 100 + 2 * 1000);
    }

    #[test]
    fn test_timeout_returns_fail_sentinel() {
        let mut nand = polled(usize::MAX);
        let status = nand.wait_ready();
        assert_eq!(status, NandStatus::FAIL);

        let (bus, clock) = nand.into_parts();
        // Fast check plus exactly 100 polls
        assert_eq!(bus.reads, 1 + 100);
        assert_eq!(bus.writes.len(), 1);
        assert_eq!(clock.busy_waits, 1);
        assert_eq!(clock.sleeps, 100);
        assert_eq!(clock.elapsed_us, 100 + 100 * 1000);
    }

    #[test]
    fn test_checked_wait_reports_timeout() {
        let mut nand = polled(usize::MAX);
        assert_eq!(nand.wait_ready_checked(), Err(Error::ReadyTimeout));

        let mut nand = polled(0);
        assert!(nand.wait_ready_checked().unwrap().is_ready());
    }
}
