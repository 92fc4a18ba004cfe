//! Parameter page decode
//!
//! Only one field of the parameter page is used: the maximum page read time
//! (t_R, in microseconds, little endian at bytes 137..=138). It becomes the
//! chip delay hint the flash subsystem waits for after a read command.

use super::opcodes;
use super::transport::{NandTransport, StaticBusNand};
use crate::bus::{Delay, Mmio};

/// Bytes preceding the t_R field
pub const PAGE_READ_TIME_OFFSET: usize = 137;

/// Signature at the start of an ONFI parameter page
pub const ONFI_SIGNATURE: [u8; 4] = *b"ONFI";

/// Convert the raw t_R bytes (microseconds) to whole milliseconds
pub fn decode_page_read_time(low: u8, high: u8) -> u32 {
    (low as u32 + 256 * high as u32) / 1000
}

/// Read the parameter page and return the page read time in milliseconds
///
/// The ready status after the parameter page command is not checked; a
/// chip that times out simply yields whatever the data register returns.
pub fn read_page_read_time<B: Mmio, D: Delay>(nand: &mut StaticBusNand<B, D>) -> u32 {
    nand.write_command(opcodes::PARAMETER_PAGE);
    let _ = nand.wait_ready();
    nand.write_command(opcodes::READ_CYCLE1);

    let mut signature = [0u8; 4];
    for i in 0..PAGE_READ_TIME_OFFSET {
        let byte = nand.read_byte();
        if let Some(slot) = signature.get_mut(i) {
            *slot = byte;
        }
    }

    if signature != ONFI_SIGNATURE {
        log::warn!(
            "NAND parameter page signature {:02x} {:02x} {:02x} {:02x} is not ONFI",
            signature[0],
            signature[1],
            signature[2],
            signature[3]
        );
    }

    let low = nand.read_byte();
    let high = nand.read_byte();
    let delay_ms = decode_page_read_time(low, high);
    log::debug!("Page read time {}ms", delay_ms);
    delay_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ox820Config;
    use std::vec::Vec;

    /// Serves a canned parameter page; status reads are always ready
    struct PageBus {
        page: Vec<u8>,
        pos: usize,
        last_cmd: u8,
        data_reads: usize,
        commands: Vec<u8>,
    }

    impl PageBus {
        fn new(low: u8, high: u8) -> Self {
            let mut page = std::vec![0u8; 256];
            page[..4].copy_from_slice(b"ONFI");
            page[137] = low;
            page[138] = high;
            Self {
                page,
                pos: 0,
                last_cmd: 0,
                data_reads: 0,
                commands: Vec::new(),
            }
        }
    }

    impl Mmio for PageBus {
        fn read8(&mut self, _offset: usize) -> u8 {
            if self.last_cmd == opcodes::READ_STATUS {
                return 0x40;
            }
            self.data_reads += 1;
            let byte = self.page[self.pos];
            self.pos += 1;
            byte
        }
        fn write8(&mut self, offset: usize, value: u8) {
            if offset == 1 << 19 {
                self.last_cmd = value;
                self.commands.push(value);
            }
        }
        fn read32(&mut self, _offset: usize) -> u32 {
            0
        }
        fn write32(&mut self, _offset: usize, _value: u32) {}
    }

    struct NoDelay;

    impl Delay for NoDelay {
        fn delay_us(&mut self, _us: u32) {}
        fn sleep_ms(&mut self, _ms: u32) {}
    }

    fn read_with(low: u8, high: u8) -> (u32, PageBus) {
        let mut nand = StaticBusNand::new(PageBus::new(low, high), NoDelay, &Ox820Config::default());
        let ms = read_page_read_time(&mut nand);
        (ms, nand.into_parts().0)
    }

    #[test]
    fn test_decode_truncates_to_milliseconds() {
        assert_eq!(decode_page_read_time(200, 1), 0);
        assert_eq!(decode_page_read_time(0xe8, 0x03), 1);
        assert_eq!(decode_page_read_time(0xff, 0xff), 65);
    }

    #[test]
    fn test_skips_exactly_137_bytes() {
        let (ms, bus) = read_with(200, 1);
        assert_eq!(ms, 0);
        assert_eq!(bus.data_reads, 137 + 2);
        assert_eq!(
            bus.commands,
            [opcodes::PARAMETER_PAGE, opcodes::READ_STATUS, opcodes::READ_CYCLE1]
        );
    }

    #[test]
    fn test_reads_low_byte_first() {
        // 25000us = 0x61a8
        let (ms, _) = read_with(0xa8, 0x61);
        assert_eq!(ms, 25);
    }
}
