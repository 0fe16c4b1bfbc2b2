//! Boolean option values as written by humans (`yes`, `off`, `true`, ...).
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// A boolean configuration option.
///
/// Accepts `yes/no`, `on/off`, `true/false` and `1/0` (case-insensitive)
/// from the command line, and the same strings or native booleans from TOML.
///
/// # Examples
///
/// ```
/// use reconcile_cli::config::flag::Flag;
///
/// assert!("yes".parse::<Flag>().unwrap().enabled());
/// assert!(!"Off".parse::<Flag>().unwrap().enabled());
/// assert!("maybe".parse::<Flag>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(bool);

impl Flag {
    /// Enabled flag.
    pub const YES: Self = Self(true);
    /// Disabled flag.
    pub const NO: Self = Self(false);

    /// Whether the option is switched on.
    #[must_use]
    pub const fn enabled(self) -> bool {
        self.0
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl FromStr for Flag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "on" | "true" | "1" => Ok(Self(true)),
            "no" | "off" | "false" | "0" => Ok(Self(false)),
            _ => Err(ConfigError::InvalidValue {
                field: "flag".to_string(),
                value: s.to_string(),
                reason: "expected yes/no, on/off, true/false or 1/0".to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(Self(b)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
