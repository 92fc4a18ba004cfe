//! Status register and control line flags

use bitflags::bitflags;

bitflags! {
    /// NAND status register
    ///
    /// | Bit | Description       |
    /// | --- | ----------------- |
    /// | 0   | Fail (1 = failed) |
    /// | 6   | Ready (1 = ready) |
    /// | 7   | Write protect (0 = protected) |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NandStatus: u8 {
        /// Last program/erase failed
        const FAIL = 1 << 0;
        /// Chip is ready for a new command
        const READY = 1 << 6;
        /// Chip is not write protected
        const WRITE_PROTECT_DISABLE = 1 << 7;
    }
}

impl NandStatus {
    /// Check if the ready bit is set
    pub fn is_ready(&self) -> bool {
        self.contains(Self::READY)
    }

    /// Check if the fail bit is set
    pub fn is_failed(&self) -> bool {
        self.contains(Self::FAIL)
    }
}

bitflags! {
    /// Control lines for a command/address strobe
    ///
    /// Naming follows the Linux NAND core (`NAND_CLE`, `NAND_ALE`, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CtrlFlags: u32 {
        /// Chip enable asserted
        const NCE = 0x01;
        /// Command latch enable
        const CLE = 0x02;
        /// Address latch enable
        const ALE = 0x04;
        /// Control lines changed since the previous call
        const CTRL_CHANGE = 0x80;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bits() {
        let status = NandStatus::from_bits_truncate(0b1100_0000);
        assert!(status.is_ready());
        assert!(!status.is_failed());

        let status = NandStatus::from_bits_truncate(0b0000_0001);
        assert!(!status.is_ready());
        assert!(status.is_failed());

        assert_eq!(NandStatus::FAIL.bits(), 0x01);
        assert_eq!(NandStatus::READY.bits(), 0x40);
    }
}
