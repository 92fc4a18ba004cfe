//! ox820-nand-physmap - Real register access for the OX820 NAND driver
//!
//! This crate maps the two windows the attach sequence needs out of
//! `/dev/mem`:
//!
//! - static chip select 0, where the NAND data register and latches live
//! - the system controller, for pin multiplexing, clock and reset
//!
//! Both are returned as [`PhysMap`]s, which implement
//! [`Mmio`](ox820_nand_core::bus::Mmio).

pub mod error;
pub mod physmap;

pub use error::{PhysmapError, Result};
pub use physmap::PhysMap;

use ox820_nand_core::Ox820Config;

/// Register windows of an OX820 board
pub struct Ox820Hardware {
    /// Static chip select 0
    pub nand: PhysMap,
    /// System controller
    pub sysctrl: PhysMap,
}

impl Ox820Hardware {
    /// Map both windows described by `config`
    pub fn map(config: &Ox820Config) -> Result<Self> {
        config.validate()?;

        log::info!(
            "Mapping OX820 static bus at {:#x} and system controller at {:#x}",
            config.static_base,
            config.sysctrl_base
        );
        let nand = PhysMap::new(config.static_base, config.static_window)?;
        let sysctrl = PhysMap::new(config.sysctrl_base, config.sysctrl_window)?;

        Ok(Self { nand, sysctrl })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected_before_mapping() {
        let config = Ox820Config {
            command_latch: 0,
            ..Ox820Config::default()
        };
        assert!(matches!(
            Ox820Hardware::map(&config),
            Err(PhysmapError::Config(_))
        ));
    }
}
