//! Partition types
//!
//! Core types for partition tables that work in no_std environments.

use core::fmt;

/// Length of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionSize {
    /// A fixed number of bytes
    Bytes(u64),
    /// Everything from the offset to the end of the device
    RestOfDevice,
}

/// A named region of the flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Name the subsystem exposes the partition under
    pub name: &'static str,
    /// Absolute byte offset
    pub offset: u64,
    /// Length of the partition
    pub size: PartitionSize,
}

/// A partition resolved against a concrete device size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPartition {
    /// Name of the partition
    pub name: &'static str,
    /// Start address (inclusive)
    pub start: u64,
    /// End address (exclusive)
    pub end: u64,
}

impl Partition {
    /// Create a partition with a fixed length
    pub const fn new(name: &'static str, offset: u64, len: u64) -> Self {
        Self {
            name,
            offset,
            size: PartitionSize::Bytes(len),
        }
    }

    /// Create a partition that runs to the end of the device
    pub const fn rest_of_device(name: &'static str, offset: u64) -> Self {
        Self {
            name,
            offset,
            size: PartitionSize::RestOfDevice,
        }
    }

    /// Check if this partition extends to the end of the device
    pub fn is_rest_of_device(&self) -> bool {
        self.size == PartitionSize::RestOfDevice
    }

    /// Resolve offset and length against a device of `device_size` bytes
    pub fn resolve(&self, device_size: u64) -> Result<ResolvedPartition, PartitionError> {
        let end = match self.size {
            PartitionSize::Bytes(len) => self
                .offset
                .checked_add(len)
                .ok_or(PartitionError::OutOfBounds { name: self.name })?,
            PartitionSize::RestOfDevice => device_size,
        };

        if self.offset >= device_size || end > device_size || end <= self.offset {
            return Err(PartitionError::OutOfBounds { name: self.name });
        }

        Ok(ResolvedPartition {
            name: self.name,
            start: self.offset,
            end,
        })
    }
}

impl ResolvedPartition {
    /// Get the size of this partition in bytes
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Check if an address is within this partition
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Check if this partition overlaps with another
    pub fn overlaps(&self, other: &ResolvedPartition) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An ordered, immutable partition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionTable {
    entries: &'static [Partition],
}

impl PartitionTable {
    /// Wrap a static slice of partitions
    pub const fn new(entries: &'static [Partition]) -> Self {
        Self { entries }
    }

    /// All entries, in registration order
    pub fn entries(&self) -> &'static [Partition] {
        self.entries
    }

    /// Iterate over the entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &'static Partition> {
        self.entries.iter()
    }

    /// Get the number of partitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find a partition by name (exact match)
    pub fn find(&self, name: &str) -> Option<&'static Partition> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Validate the table against a device size
    ///
    /// Every entry must fit on the device and names must be unique.
    /// Overlapping entries are accepted.
    pub fn validate(&self, device_size: u64) -> Result<(), PartitionError> {
        for (i, p1) in self.entries.iter().enumerate() {
            p1.resolve(device_size)?;
            for p2 in self.entries.iter().skip(i + 1) {
                if p1.name == p2.name {
                    return Err(PartitionError::DuplicateName { name: p1.name });
                }
            }
        }
        Ok(())
    }
}

/// Errors that can occur when working with partition tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    /// Partition does not fit on the device
    OutOfBounds {
        /// Name of the partition
        name: &'static str,
    },
    /// Two partitions share a name
    DuplicateName {
        /// The duplicated name
        name: &'static str,
    },
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { name } => {
                write!(f, "partition '{}' extends beyond the device", name)
            }
            Self::DuplicateName { name } => write!(f, "duplicate partition name '{}'", name),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PartitionError {}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_resolve_fixed_and_rest() {
        let fixed = Partition::new("kernel", 0x20_0000, 0x40_0000);
        let r = fixed.resolve(128 * MIB).unwrap();
        assert_eq!((r.start, r.end, r.size()), (0x20_0000, 0x60_0000, 0x40_0000));
        assert!(r.contains(0x5f_ffff));
        assert!(!r.contains(0x60_0000));

        let rest = Partition::rest_of_device("rootfs", 0x60_0000);
        let r = rest.resolve(128 * MIB).unwrap();
        assert_eq!(r.end, 128 * MIB);
        assert_eq!(r.size(), 128 * MIB - 0x60_0000);
    }

    #[test]
    fn test_resolve_out_of_bounds() {
        let p = Partition::new("big", 0, 2 * MIB);
        assert_eq!(
            p.resolve(MIB),
            Err(PartitionError::OutOfBounds { name: "big" })
        );
        let p = Partition::rest_of_device("tail", MIB);
        assert!(p.resolve(MIB).is_err());
        let p = Partition::new("wrap", u64::MAX, 2);
        assert!(p.resolve(MIB).is_err());
    }

    #[test]
    fn test_overlaps() {
        let a = Partition::new("a", 0, 0x100).resolve(MIB).unwrap();
        let b = Partition::new("b", 0x80, 0x100).resolve(MIB).unwrap();
        let c = Partition::new("c", 0x100, 0x100).resolve(MIB).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&c));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        static DUP: [Partition; 2] = [Partition::new("x", 0, 0x10), Partition::new("x", 0x10, 0x10)];
        let table = PartitionTable::new(&DUP);
        assert_eq!(
            table.validate(MIB),
            Err(PartitionError::DuplicateName { name: "x" })
        );
    }
}
