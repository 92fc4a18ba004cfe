//! Physical memory mapping for MMIO access
//!
//! Maps a physical range through /dev/mem so the static bus window and the
//! system controller can be driven from user space. Requires root.

use ox820_nand_core::bus::Mmio;

use crate::error::{PhysmapError, Result};

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the requested physical address inside the mapping
    ptr: *mut u8,
    /// Requested length
    len: usize,
    /// Length of the page-aligned mapping
    map_size: usize,
    /// Physical address (for error reporting and unmapping)
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
fn page_mask() -> usize {
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    page_size - 1
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `len` bytes of physical memory starting at `phys_addr`
    ///
    /// The range must be device registers nobody else drives concurrently.
    pub fn new(phys_addr: u64, len: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(PhysmapError::OpenFailed)?;

        let page_mask = page_mask();
        let offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (len + offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(PhysmapError::MapFailed {
                address: phys_addr,
                size: len,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "Mapped {:#x} bytes of physical memory at {:#x}",
            len,
            phys_addr
        );

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(offset) },
            len,
            map_size,
            phys_addr,
        })
    }

    /// Read an 8-bit value
    #[inline]
    pub fn read8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len, "read8 at {:#x} outside window", offset);
        unsafe { core::ptr::read_volatile(self.ptr.add(offset)) }
    }

    /// Read an aligned 32-bit value
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len, "read32 at {:#x} outside window", offset);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Write an 8-bit value
    #[inline]
    pub fn write8(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len, "write8 at {:#x} outside window", offset);
        unsafe { core::ptr::write_volatile(self.ptr.add(offset), value) }
    }

    /// Write an aligned 32-bit value
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.len, "write32 at {:#x} outside window", offset);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }

    /// Physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Usable length of this mapping
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        let offset = (self.phys_addr as usize) & page_mask();
        unsafe {
            libc::munmap(self.ptr.sub(offset) as *mut libc::c_void, self.map_size);
        }
    }
}

// MMIO registers have no aliasing concerns
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}

// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    /// Always fails: /dev/mem is Linux only
    pub fn new(_phys_addr: u64, _len: usize) -> Result<Self> {
        Err(PhysmapError::NotSupported(
            "Physical memory mapping only supported on Linux",
        ))
    }

    pub fn read8(&self, _offset: usize) -> u8 {
        0
    }
    pub fn read32(&self, _offset: usize) -> u32 {
        0
    }
    pub fn write8(&self, _offset: usize, _value: u8) {}
    pub fn write32(&self, _offset: usize, _value: u32) {}
    pub fn phys_addr(&self) -> u64 {
        0
    }
    pub fn len(&self) -> usize {
        0
    }
    pub fn is_empty(&self) -> bool {
        true
    }
}

impl Mmio for PhysMap {
    fn read8(&mut self, offset: usize) -> u8 {
        PhysMap::read8(self, offset)
    }

    fn write8(&mut self, offset: usize, value: u8) {
        PhysMap::write8(self, offset, value)
    }

    fn read32(&mut self, offset: usize) -> u32 {
        PhysMap::read32(self, offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        PhysMap::write32(self, offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires root and /dev/mem access
    fn test_map_sysctrl() {
        let map = PhysMap::new(ox820_nand_core::regs::SYS_CONTROL_BASE, 0x100).unwrap();
        assert_eq!(map.len(), 0x100);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[ignore] // Requires root and /dev/mem access
    #[should_panic(expected = "outside window")]
    fn test_access_outside_window_caught_in_debug() {
        let map = PhysMap::new(ox820_nand_core::regs::SYS_CONTROL_BASE, 0x100).unwrap();
        map.read32(0x100);
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn test_unsupported_platform() {
        assert!(matches!(
            PhysMap::new(0, 0x1000),
            Err(PhysmapError::NotSupported(_))
        ));
    }
}
