//! OX820 register definitions
//!
//! Physical addresses, register offsets and bit positions for the parts of
//! the OX820 system controller and static memory bus that the NAND driver
//! touches.
//!
//! # Static bus decoding
//!
//! The NAND chip sits on static chip select 0. Address line A18 drives ALE
//! and A19 drives CLE, so a write lands in the address latch, the command
//! latch or the data register depending on the offset inside the window.

// ============================================================================
// Static memory bus (chip select 0)
// ============================================================================

/// Physical base address of static chip select 0
pub const STATIC_CS0_BASE: u64 = 0x4100_0000;
/// Offset of the NAND data register inside the CS0 window
pub const NAND_DATA: usize = 0x0000;
/// Offset of the NAND address latch (A18 high)
pub const NAND_ADDRESS_LATCH: usize = 1 << 18;
/// Offset of the NAND command latch (A19 high)
pub const NAND_COMMAND_LATCH: usize = 1 << 19;
/// Size of the CS0 window that covers data and both latches
pub const STATIC_CS0_WINDOW: usize = 1 << 20;

// ============================================================================
// System controller
// ============================================================================

/// Physical base address of the system controller block
pub const SYS_CONTROL_BASE: u64 = 0x44e0_0000;
/// Size of the system controller window
pub const SYS_CONTROL_WINDOW: usize = 0x1000;

/// Secondary function select for GPIO bank A (MFA)
pub const SYSCTRL_MFA_SECSEL_CTRL: usize = 0x14;
/// Clock enable set register (write 1 to enable)
pub const SYS_CTRL_CKEN_SET_CTRL: usize = 0x2c;
/// Block reset clear register (write 1 to release reset)
pub const SYS_CTRL_RSTEN_CLR_CTRL: usize = 0x38;

/// Static bus clock enable bit in CKEN
pub const SYS_CTRL_CKEN_STATIC_BIT: u32 = 9;
/// Static bus reset bit in RSTEN
pub const SYS_CTRL_RSTEN_STATIC_BIT: u32 = 15;

/// Secondary function pins for the NAND on static CS0
///
/// gpioa12..gpioa19 (data bus), gpioa20 (WE), gpioa21 (OE), gpioa22 (CS0),
/// gpioa23 and gpioa24.
pub const STATIC_NAND_ENABLE0: u32 = 0x01ff_f000;
