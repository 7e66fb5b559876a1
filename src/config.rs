//! Configuration Module
//!
//! Eviction policy for a cache: capacity cap, expiry, sweep cadence and the
//! per-sweep work limit. Values can be loaded from environment variables or
//! built up in code.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

/// Number of entries a single sweep may remove when no cap is configured.
pub const DEFAULT_SWEEP_CAP: usize = 1 << 16;

/// Lower bound for a sweep interval derived from the expiry.
pub const MIN_DERIVED_SWEEP_INTERVAL: Duration = Duration::from_micros(1);

/// Upper bound for a sweep interval derived from the expiry.
pub const MAX_DERIVED_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache eviction policy.
///
/// Every field uses zero to mean "off" or "pick for me", so
/// `Config::default()` is an unbounded cache with no expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of entries kept after a sweep (0 = unbounded)
    pub max_entries: usize,
    /// Age at which an entry expires (0 = never)
    pub expiry: Duration,
    /// Time between background sweeps (0 = derived from `expiry`)
    pub sweep_interval: Duration,
    /// Maximum removals per sweep (0 = `DEFAULT_SWEEP_CAP`)
    pub sweep_cap: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Capacity cap (default: 0, unbounded)
    /// - `CACHE_EXPIRY_MS` - Expiry in milliseconds (default: 0, disabled)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep interval in milliseconds (default: 0, auto)
    /// - `CACHE_SWEEP_CAP` - Removals per sweep (default: 0, 65536)
    ///
    /// A variable that is set but not a non-negative integer is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Loads a Config through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |var: &'static str| -> Result<u64> {
            match lookup(var) {
                None => Ok(0),
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| CacheError::InvalidConfig { var, value }),
            }
        };

        let parse_usize = |var: &'static str| -> Result<usize> {
            usize::try_from(parse(var)?).map_err(|_| CacheError::InvalidConfig {
                var,
                value: lookup(var).unwrap_or_default(),
            })
        };

        let config = Self {
            max_entries: parse_usize("CACHE_MAX_ENTRIES")?,
            expiry: Duration::from_millis(parse("CACHE_EXPIRY_MS")?),
            sweep_interval: Duration::from_millis(parse("CACHE_SWEEP_INTERVAL_MS")?),
            sweep_cap: parse_usize("CACHE_SWEEP_CAP")?,
        };
        debug!(?config, "Cache configuration loaded");
        Ok(config)
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_sweep_cap(mut self, sweep_cap: usize) -> Self {
        self.sweep_cap = sweep_cap;
        self
    }

    /// Removal budget of one sweep.
    pub fn effective_sweep_cap(&self) -> usize {
        if self.sweep_cap == 0 {
            DEFAULT_SWEEP_CAP
        } else {
            self.sweep_cap
        }
    }

    /// Interval the watcher sleeps between passes.
    ///
    /// An explicit `sweep_interval` is used as is. Otherwise a tenth of the
    /// expiry, kept within `[1µs, 1min]`.
    pub fn effective_sweep_interval(&self) -> Duration {
        if !self.sweep_interval.is_zero() {
            return self.sweep_interval;
        }
        (self.expiry / 10).clamp(MIN_DERIVED_SWEEP_INTERVAL, MAX_DERIVED_SWEEP_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 0);
        assert!(config.expiry.is_zero());
        assert!(config.sweep_interval.is_zero());
        assert_eq!(config.sweep_cap, 0);
        assert_eq!(config.effective_sweep_cap(), DEFAULT_SWEEP_CAP);
    }

    #[test]
    fn test_config_from_vars_defaults() {
        let config = Config::from_vars(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_from_vars_values() {
        let config = Config::from_vars(lookup(&[
            ("CACHE_MAX_ENTRIES", "500"),
            ("CACHE_EXPIRY_MS", "2000"),
            ("CACHE_SWEEP_INTERVAL_MS", " 250 "),
            ("CACHE_SWEEP_CAP", "64"),
        ]))
        .unwrap();

        assert_eq!(config.max_entries, 500);
        assert_eq!(config.expiry, Duration::from_secs(2));
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
        assert_eq!(config.sweep_cap, 64);
    }

    #[test]
    fn test_config_from_vars_malformed() {
        let result = Config::from_vars(lookup(&[("CACHE_EXPIRY_MS", "-5")]));
        match result {
            Err(CacheError::InvalidConfig { var, value }) => {
                assert_eq!(var, "CACHE_EXPIRY_MS");
                assert_eq!(value, "-5");
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_config_from_vars_full_width_count() {
        let config = Config::from_vars(lookup(&[("CACHE_SWEEP_CAP", "18446744073709551615")]))
            .unwrap();
        assert_eq!(config.sweep_cap, usize::MAX);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_config_from_vars_count_too_wide() {
        let result = Config::from_vars(lookup(&[("CACHE_MAX_ENTRIES", "4294967296")]));
        match result {
            Err(CacheError::InvalidConfig { var, value }) => {
                assert_eq!(var, "CACHE_MAX_ENTRIES");
                assert_eq!(value, "4294967296");
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("CACHE_SWEEP_CAP", "12");
        let config = Config::from_env().unwrap();
        env::remove_var("CACHE_SWEEP_CAP");

        assert_eq!(config.sweep_cap, 12);
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_max_entries(10)
            .with_expiry(Duration::from_secs(5))
            .with_sweep_interval(Duration::from_millis(100))
            .with_sweep_cap(3);

        assert_eq!(config.max_entries, 10);
        assert_eq!(config.expiry, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Duration::from_millis(100));
        assert_eq!(config.effective_sweep_cap(), 3);
    }

    #[test]
    fn test_explicit_sweep_interval_wins() {
        let config = Config::default()
            .with_expiry(Duration::from_secs(10))
            .with_sweep_interval(Duration::from_millis(7));
        assert_eq!(config.effective_sweep_interval(), Duration::from_millis(7));
    }

    #[test]
    fn test_derived_sweep_interval() {
        let config = Config::default().with_expiry(Duration::from_secs(10));
        assert_eq!(config.effective_sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_derived_sweep_interval_clamped() {
        let no_expiry = Config::default();
        assert_eq!(
            no_expiry.effective_sweep_interval(),
            MIN_DERIVED_SWEEP_INTERVAL
        );

        let long_expiry = Config::default().with_expiry(Duration::from_secs(3600));
        assert_eq!(
            long_expiry.effective_sweep_interval(),
            MAX_DERIVED_SWEEP_INTERVAL
        );
    }

    #[test]
    fn test_config_serializes() {
        let config = Config::default().with_max_entries(3);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["max_entries"], 3);

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
