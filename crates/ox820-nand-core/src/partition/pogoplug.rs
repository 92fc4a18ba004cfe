//! Pogoplug Series 3 flash layout
//!
//! 128 MiB NAND with 128 KiB erase blocks. The boot area (first 112 blocks)
//! holds stage1, U-Boot, its environment and the factory data, each followed
//! by a backup copy. "fullflash", "boot" and "firmware" are umbrella views
//! over the regions below them.

use super::types::{Partition, PartitionTable};

static ENTRIES: [Partition; 13] = [
    Partition::rest_of_device("fullflash", 0x0),
    Partition::new("boot", 0x0, 0xe0_0000),
    Partition::new("stage1", 0x0, 0x2_0000),
    Partition::new("stage1-backup", 0x2_0000, 0x2_0000),
    Partition::new("u-boot", 0x4_0000, 0x6_0000),
    Partition::new("u-boot-env", 0xa_0000, 0x2_0000),
    Partition::new("factory", 0xc_0000, 0x4_0000),
    Partition::new("u-boot-backup", 0x10_0000, 0x6_0000),
    Partition::new("u-boot-env-backup", 0x16_0000, 0x2_0000),
    Partition::new("factory-backup", 0x18_0000, 0x4_0000),
    Partition::new("kernel", 0x20_0000, 0x40_0000),
    Partition::rest_of_device("rootfs", 0x60_0000),
    Partition::rest_of_device("firmware", 0x20_0000),
];

/// Partition table registered for the Pogoplug Series 3
pub static POGOPLUG_V3_PARTITIONS: PartitionTable = PartitionTable::new(&ENTRIES);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitionSize;

    const FLASH_SIZE: u64 = 128 * 1024 * 1024;

    #[test]
    fn test_table_matches_board_layout() {
        let expected: [(&str, u64, Option<u64>); 13] = [
            ("fullflash", 0x0, None),
            ("boot", 0x0, Some(0xE00000)),
            ("stage1", 0x0, Some(0x20000)),
            ("stage1-backup", 0x20000, Some(0x20000)),
            ("u-boot", 0x40000, Some(0x60000)),
            ("u-boot-env", 0xA0000, Some(0x20000)),
            ("factory", 0xC0000, Some(0x40000)),
            ("u-boot-backup", 0x100000, Some(0x60000)),
            ("u-boot-env-backup", 0x160000, Some(0x20000)),
            ("factory-backup", 0x180000, Some(0x40000)),
            ("kernel", 0x200000, Some(0x400000)),
            ("rootfs", 0x600000, None),
            ("firmware", 0x200000, None),
        ];

        assert_eq!(POGOPLUG_V3_PARTITIONS.len(), expected.len());
        for (part, (name, offset, len)) in POGOPLUG_V3_PARTITIONS.iter().zip(expected) {
            assert_eq!(part.name, name);
            assert_eq!(part.offset, offset, "offset of {}", name);
            let size = match len {
                Some(len) => PartitionSize::Bytes(len),
                None => PartitionSize::RestOfDevice,
            };
            assert_eq!(part.size, size, "size of {}", name);
        }
    }

    #[test]
    fn test_overlaps_are_intentional() {
        let rootfs = POGOPLUG_V3_PARTITIONS.find("rootfs").unwrap();
        let firmware = POGOPLUG_V3_PARTITIONS.find("firmware").unwrap();
        assert!(rootfs.is_rest_of_device());
        assert!(firmware.is_rest_of_device());

        let rootfs = rootfs.resolve(FLASH_SIZE).unwrap();
        let firmware = firmware.resolve(FLASH_SIZE).unwrap();
        let kernel = POGOPLUG_V3_PARTITIONS
            .find("kernel")
            .unwrap()
            .resolve(FLASH_SIZE)
            .unwrap();
        assert!(firmware.overlaps(&rootfs));
        assert!(firmware.overlaps(&kernel));
        assert!(!kernel.overlaps(&rootfs));
        assert_eq!(rootfs.size(), 0x7a0_0000);

        let boot = POGOPLUG_V3_PARTITIONS
            .find("boot")
            .unwrap()
            .resolve(FLASH_SIZE)
            .unwrap();
        for name in ["stage1-backup", "u-boot-backup", "factory-backup"] {
            let backup = POGOPLUG_V3_PARTITIONS
                .find(name)
                .unwrap()
                .resolve(FLASH_SIZE)
                .unwrap();
            assert!(boot.overlaps(&backup), "{} inside boot", name);
        }
    }

    #[test]
    fn test_table_fits_128mib_device() {
        assert!(POGOPLUG_V3_PARTITIONS.validate(FLASH_SIZE).is_ok());
        // The boot area alone is 14 MiB
        assert!(POGOPLUG_V3_PARTITIONS.validate(8 * 1024 * 1024).is_err());
    }
}
