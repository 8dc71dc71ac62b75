use std::env;
use std::path::PathBuf;

use crate::common::keygen::{check_key_bits, DEFAULT_KEY_BITS};
use crate::error::{KeyMgtError, Result};

pub const BITS_ENV: &str = "RSA_KEY_BITS";
pub const DIR_ENV: &str = "RSA_KEY_DIR";

/// Settings for the `keygen` binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeygenConfig {
    pub bits: usize,
    pub out_dir: PathBuf,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            bits: DEFAULT_KEY_BITS,
            out_dir: PathBuf::from("."),
        }
    }
}

impl KeygenConfig {
    /// Reads `RSA_KEY_BITS` and `RSA_KEY_DIR`; the first command line argument
    /// overrides the bit length.
    pub fn from_env() -> Result<Self> {
        Self::from_sources(|key| env::var(key).ok(), env::args().skip(1))
    }

    pub fn from_sources<F, I>(lookup: F, args: I) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();

        if let Some(bits) = lookup(BITS_ENV) {
            config.bits = parse_bits(BITS_ENV, &bits)?;
        }
        if let Some(dir) = lookup(DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            config.out_dir = PathBuf::from(dir);
        }
        if let Some(bits) = args.into_iter().next() {
            config.bits = parse_bits("argument", &bits)?;
        }

        check_key_bits(config.bits)?;
        Ok(config)
    }
}

fn parse_bits(source: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        KeyMgtError::InvalidConfig(format!(
            "{} must be a positive bit length, got {:?}",
            source, value
        ))
    })
}
