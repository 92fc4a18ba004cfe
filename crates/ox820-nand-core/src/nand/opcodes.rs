//! NAND command opcodes
//!
//! The subset of the ONFI command set the static bus controller issues or
//! that the flash subsystem sends through the command latch.

// ============================================================================
// Read
// ============================================================================

/// Read, first cycle (also "read parameter page data" after 0xEC)
pub const READ_CYCLE1: u8 = 0x00;
/// Read, second cycle (confirm)
pub const READ_CYCLE2: u8 = 0x30;
/// Sequential cache read
pub const CACHE_READ: u8 = 0x31;

// ============================================================================
// Program / erase
// ============================================================================

/// Page program, first cycle
pub const WRITE_CYCLE1: u8 = 0x80;
/// Page program, second cycle (confirm)
pub const WRITE_CYCLE2: u8 = 0x10;
/// Block erase, first cycle
pub const BLOCK_ERASE: u8 = 0x60;
/// Block erase confirm
pub const ERASE_CONFIRM: u8 = 0xd0;

// ============================================================================
// Status and identification
// ============================================================================

/// Read status register
pub const READ_STATUS: u8 = 0x70;
/// Read ID
pub const READ_ID: u8 = 0x90;
/// Read parameter page
pub const PARAMETER_PAGE: u8 = 0xec;
/// Reset the chip
pub const RESET: u8 = 0xff;
