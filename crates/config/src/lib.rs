//! # Config - StrataKV engine options
//!
//! [`EngineConfig`] is the immutable option set handed to `Engine::open`.
//! Build it from [`Default`], adjust it with the `with_*` setters, or load it
//! from the environment with [`EngineConfig::from_env`].
//!
//! ## Environment
//!
//! ```text
//! STRATA_MEMTABLE_BYTES  memtable flush threshold in bytes   (default: 8000)
//! STRATA_BLOOM_ITEMS     bloom filter expected items         (default: 10000)
//! STRATA_BLOOM_FPR       bloom filter false positive rate    (default: 0.01)
//! STRATA_LEVEL_RATIO     table-count growth per level        (default: 10)
//! STRATA_L0_TARGET       level-0 table-count target          (default: 4)
//! STRATA_DATA_DIR        storage directory                   (default: "./data")
//! STRATA_STRICT_DELETE   deleting a missing key is an error  (default: false)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const ENV_MEMTABLE_BYTES: &str = "STRATA_MEMTABLE_BYTES";
pub const ENV_BLOOM_ITEMS: &str = "STRATA_BLOOM_ITEMS";
pub const ENV_BLOOM_FPR: &str = "STRATA_BLOOM_FPR";
pub const ENV_LEVEL_RATIO: &str = "STRATA_LEVEL_RATIO";
pub const ENV_L0_TARGET: &str = "STRATA_L0_TARGET";
pub const ENV_DATA_DIR: &str = "STRATA_DATA_DIR";
pub const ENV_STRICT_DELETE: &str = "STRATA_STRICT_DELETE";

pub const DEFAULT_MEMTABLE_THRESHOLD: usize = 8000;
pub const DEFAULT_BLOOM_EXPECTED_ITEMS: usize = 10_000;
pub const DEFAULT_BLOOM_FALSE_POSITIVE_RATE: f64 = 0.01;
pub const DEFAULT_LEVEL_RATIO: usize = 10;
pub const DEFAULT_L0_TARGET: usize = 4;
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Engine options.
///
/// Fields are public for reading; once passed to the engine the config is
/// never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Flush once the memtable's size estimate reaches this many bytes.
    pub memtable_threshold: usize,
    /// `n` used to size every table's bloom filter.
    pub bloom_expected_items: usize,
    /// `p` used to size every table's bloom filter.
    pub bloom_false_positive_rate: f64,
    /// Level `i` holds at most `l0_target * level_ratio^i` tables.
    pub level_ratio: usize,
    pub l0_target: usize,
    pub data_dir: PathBuf,
    /// When true, deleting a key that is not live anywhere returns NotFound
    /// instead of succeeding as a no-op.
    pub delete_missing_is_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memtable_threshold: DEFAULT_MEMTABLE_THRESHOLD,
            bloom_expected_items: DEFAULT_BLOOM_EXPECTED_ITEMS,
            bloom_false_positive_rate: DEFAULT_BLOOM_FALSE_POSITIVE_RATE,
            level_ratio: DEFAULT_LEVEL_RATIO,
            l0_target: DEFAULT_L0_TARGET,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            delete_missing_is_error: false,
        }
    }
}

impl EngineConfig {
    /// Defaults with the storage directory set to `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::default().with_data_dir(dir)
    }

    #[must_use]
    pub fn with_memtable_threshold(mut self, bytes: usize) -> Self {
        self.memtable_threshold = bytes;
        self
    }

    #[must_use]
    pub fn with_bloom(mut self, expected_items: usize, false_positive_rate: f64) -> Self {
        self.bloom_expected_items = expected_items;
        self.bloom_false_positive_rate = false_positive_rate;
        self
    }

    #[must_use]
    pub fn with_level_ratio(mut self, ratio: usize) -> Self {
        self.level_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_l0_target(mut self, tables: usize) -> Self {
        self.l0_target = tables;
        self
    }

    #[must_use]
    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_delete_missing_is_error(mut self, strict: bool) -> Self {
        self.delete_missing_is_error = strict;
        self
    }

    /// Loads options from the process environment, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a variable is set but does not parse, or
    /// the resulting config fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let config = Self {
            memtable_threshold: parse_or(&lookup, ENV_MEMTABLE_BYTES, d.memtable_threshold)?,
            bloom_expected_items: parse_or(&lookup, ENV_BLOOM_ITEMS, d.bloom_expected_items)?,
            bloom_false_positive_rate: parse_or(
                &lookup,
                ENV_BLOOM_FPR,
                d.bloom_false_positive_rate,
            )?,
            level_ratio: parse_or(&lookup, ENV_LEVEL_RATIO, d.level_ratio)?,
            l0_target: parse_or(&lookup, ENV_L0_TARGET, d.l0_target)?,
            data_dir: lookup(ENV_DATA_DIR).map_or(d.data_dir, PathBuf::from),
            delete_missing_is_error: match lookup(ENV_STRICT_DELETE) {
                Some(raw) => parse_bool(ENV_STRICT_DELETE, &raw)?,
                None => d.delete_missing_is_error,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.memtable_threshold == 0 {
            return Err(invalid("memtable_threshold", "must be > 0"));
        }
        if self.bloom_expected_items == 0 {
            return Err(invalid("bloom_expected_items", "must be > 0"));
        }
        let p = self.bloom_false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(invalid(
                "bloom_false_positive_rate",
                format!("must be in (0, 1), got {}", p),
            ));
        }
        if self.level_ratio < 2 {
            return Err(invalid(
                "level_ratio",
                format!("must be >= 2, got {}", self.level_ratio),
            ));
        }
        if self.l0_target == 0 {
            return Err(invalid("l0_target", "must be >= 1"));
        }
        Ok(())
    }

    /// Table-count target for `level`: `l0_target * level_ratio^level`,
    /// saturating.
    #[must_use]
    pub fn level_capacity(&self, level: usize) -> usize {
        let exp = u32::try_from(level).unwrap_or(u32::MAX);
        self.l0_target
            .saturating_mul(self.level_ratio.saturating_pow(exp))
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            invalid(key, format!("cannot parse {:?}: {}", raw, e))
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, format!("expected a boolean, got {:?}", raw))),
    }
}
