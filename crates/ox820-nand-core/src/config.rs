//! Board configuration
//!
//! The defaults describe the Pogoplug Series 3 (OX820, NAND on static chip
//! select 0). They can be overridden from `key=value` option pairs or, with
//! the `std` feature, from a TOML file:
//!
//! ```toml
//! [bus]
//! static_base = 0x41000000
//! address_latch = 0x40000
//! command_latch = 0x80000
//!
//! [sysctrl]
//! base = 0x44e00000
//! pin_mask = 0x01fff000
//! cken_static_bit = 9
//! rsten_static_bit = 15
//! ```

use core::fmt;

use crate::regs;

/// Hardware description of the static bus NAND wiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ox820Config {
    /// Physical base of the static chip select window
    pub static_base: u64,
    /// Size of the static chip select window
    pub static_window: usize,
    /// Offset of the address latch inside the static window
    pub address_latch: usize,
    /// Offset of the command latch inside the static window
    pub command_latch: usize,
    /// Physical base of the system controller
    pub sysctrl_base: u64,
    /// Size of the system controller window
    pub sysctrl_window: usize,
    /// Secondary-function bits routing pins to the static bus
    pub pin_mask: u32,
    /// Static bus clock enable bit
    pub cken_static_bit: u32,
    /// Static bus reset bit
    pub rsten_static_bit: u32,
}

impl Default for Ox820Config {
    fn default() -> Self {
        Self {
            static_base: regs::STATIC_CS0_BASE,
            static_window: regs::STATIC_CS0_WINDOW,
            address_latch: regs::NAND_ADDRESS_LATCH,
            command_latch: regs::NAND_COMMAND_LATCH,
            sysctrl_base: regs::SYS_CONTROL_BASE,
            sysctrl_window: regs::SYS_CONTROL_WINDOW,
            pin_mask: regs::STATIC_NAND_ENABLE0,
            cken_static_bit: regs::SYS_CTRL_CKEN_STATIC_BIT,
            rsten_static_bit: regs::SYS_CTRL_RSTEN_STATIC_BIT,
        }
    }
}

/// Errors raised while building a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter could not be parsed or is out of range
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
    },
    /// The configuration file is not valid TOML
    #[cfg(feature = "std")]
    Toml(std::string::String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name } => write!(f, "invalid parameter '{}'", name),
            #[cfg(feature = "std")]
            Self::Toml(msg) => write!(f, "failed to parse configuration: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl Ox820Config {
    /// Build a configuration from `key=value` option pairs
    ///
    /// Unknown keys are logged and ignored. Missing keys keep their board
    /// default.
    pub fn parse_options(options: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (key, value) in options {
            match *key {
                "static_base" => config.static_base = parse_number(value, "static_base")?,
                "address_latch" => {
                    config.address_latch = parse_offset(value, "address_latch")?
                }
                "command_latch" => {
                    config.command_latch = parse_offset(value, "command_latch")?
                }
                "sysctrl_base" => config.sysctrl_base = parse_number(value, "sysctrl_base")?,
                "pin_mask" => config.pin_mask = parse_u32(value, "pin_mask")?,
                "cken_static_bit" => {
                    config.cken_static_bit = parse_u32(value, "cken_static_bit")?
                }
                "rsten_static_bit" => {
                    config.rsten_static_bit = parse_u32(value, "rsten_static_bit")?
                }
                _ => {
                    log::warn!("Unknown ox820 option: {}={}", key, value);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the latch offsets and bit positions are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address_latch == regs::NAND_DATA || self.address_latch >= self.static_window {
            return Err(ConfigError::InvalidParameter {
                name: "address_latch",
            });
        }
        if self.command_latch == regs::NAND_DATA
            || self.command_latch >= self.static_window
            || self.command_latch == self.address_latch
        {
            return Err(ConfigError::InvalidParameter {
                name: "command_latch",
            });
        }
        if self.cken_static_bit >= 32 {
            return Err(ConfigError::InvalidParameter {
                name: "cken_static_bit",
            });
        }
        if self.rsten_static_bit >= 32 {
            return Err(ConfigError::InvalidParameter {
                name: "rsten_static_bit",
            });
        }
        Ok(())
    }
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str, name: &'static str) -> Result<u64, ConfigError> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| ConfigError::InvalidParameter { name })
}

fn parse_u32(s: &str, name: &'static str) -> Result<u32, ConfigError> {
    let value = parse_number(s, name)?;
    u32::try_from(value).map_err(|_| ConfigError::InvalidParameter { name })
}

/// Window offsets must fit the address space, never truncate
fn to_offset(value: u64, name: &'static str) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| ConfigError::InvalidParameter { name })
}

fn parse_offset(s: &str, name: &'static str) -> Result<usize, ConfigError> {
    to_offset(parse_number(s, name)?, name)
}

#[cfg(feature = "std")]
mod file {
    use super::{parse_number, to_offset, ConfigError, Ox820Config};
    use std::string::{String, ToString};

    #[derive(Debug, Default, serde::Deserialize)]
    struct TomlConfigFile {
        #[serde(default)]
        bus: TomlBus,
        #[serde(default)]
        sysctrl: TomlSysctrl,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    struct TomlBus {
        #[serde(default, deserialize_with = "deserialize_hex")]
        static_base: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_hex")]
        address_latch: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_hex")]
        command_latch: Option<u64>,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    struct TomlSysctrl {
        #[serde(default, deserialize_with = "deserialize_hex")]
        base: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_hex")]
        pin_mask: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_hex")]
        cken_static_bit: Option<u64>,
        #[serde(default, deserialize_with = "deserialize_hex")]
        rsten_static_bit: Option<u64>,
    }

    /// Deserialize a number that can be an integer or a hex/decimal string
    fn deserialize_hex<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum HexOrInt {
            Int(u64),
            Str(String),
        }

        match HexOrInt::deserialize(deserializer)? {
            HexOrInt::Int(n) => Ok(Some(n)),
            HexOrInt::Str(s) => parse_number(&s, "value")
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format_args!("invalid number: {}", s))),
        }
    }

    fn narrow(value: u64, name: &'static str) -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|_| ConfigError::InvalidParameter { name })
    }

    impl Ox820Config {
        /// Load a configuration from TOML text
        pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
            let file: TomlConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Toml(e.to_string()))?;

            let mut config = Ox820Config::default();
            if let Some(v) = file.bus.static_base {
                config.static_base = v;
            }
            if let Some(v) = file.bus.address_latch {
                config.address_latch = to_offset(v, "address_latch")?;
            }
            if let Some(v) = file.bus.command_latch {
                config.command_latch = to_offset(v, "command_latch")?;
            }
            if let Some(v) = file.sysctrl.base {
                config.sysctrl_base = v;
            }
            if let Some(v) = file.sysctrl.pin_mask {
                config.pin_mask = narrow(v, "pin_mask")?;
            }
            if let Some(v) = file.sysctrl.cken_static_bit {
                config.cken_static_bit = narrow(v, "cken_static_bit")?;
            }
            if let Some(v) = file.sysctrl.rsten_static_bit {
                config.rsten_static_bit = narrow(v, "rsten_static_bit")?;
            }

            config.validate()?;
            Ok(config)
        }

        /// Load a configuration from a TOML file on disk
        pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Toml(e.to_string()))?;
            Self::from_toml_str(&content)
        }
    }
}
