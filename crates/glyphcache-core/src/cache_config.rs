//! Cache budget configuration
//!
//! The cache keeps its glyph bitmaps between two byte thresholds. Eviction
//! starts once the total passes `max_bytes` and stops at or below
//! `min_bytes`; the gap keeps a saturated cache from evicting on every
//! single insertion.
//!
//! # Environment Variables
//!
//! `CacheConfig::from_env()` starts from the defaults and applies:
//!
//! ```bash
//! GLYPHCACHE_MIN_BYTES=4M GLYPHCACHE_MAX_BYTES=8M ./my_app
//! ```
//!
//! Values are plain byte counts or carry a `K`/`M`/`G` suffix (powers of
//! 1024). Invalid values are ignored with a warning.

use crate::error::{GlyphCacheError, Result};

/// Default lower threshold: 8 MiB
pub const DEFAULT_MIN_BYTES: usize = 8 * 1024 * 1024;

/// Default upper threshold: 16 MiB, twice the lower one
pub const DEFAULT_MAX_BYTES: usize = 2 * DEFAULT_MIN_BYTES;

/// Default first bucket allocation for each face's glyph table
pub const DEFAULT_INITIAL_BUCKETS: usize = 16;

pub const ENV_MIN_BYTES: &str = "GLYPHCACHE_MIN_BYTES";
pub const ENV_MAX_BYTES: &str = "GLYPHCACHE_MAX_BYTES";

/// Settings supplied when a cache manager is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Eviction stops once the total is at or below this
    pub min_bytes: usize,
    /// Eviction starts once the total exceeds this
    pub max_bytes: usize,
    /// Buckets allocated for a glyph table on its first insertion
    pub initial_buckets: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_bytes: DEFAULT_MIN_BYTES,
            max_bytes: DEFAULT_MAX_BYTES,
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
        }
    }
}

impl CacheConfig {
    pub fn with_budget(min_bytes: usize, max_bytes: usize) -> Self {
        Self {
            min_bytes,
            max_bytes,
            ..Self::default()
        }
    }

    /// Defaults overridden by `GLYPHCACHE_MIN_BYTES` / `GLYPHCACHE_MAX_BYTES`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let read = |name: &str| -> Option<usize> {
            let raw = lookup(name)?;
            match parse_byte_size(&raw) {
                Some(bytes) => {
                    log::info!("Glyph cache {} set to {} bytes via env var", name, bytes);
                    Some(bytes)
                },
                None => {
                    log::warn!("Ignoring invalid {}={:?}", name, raw);
                    None
                },
            }
        };

        let min = read(ENV_MIN_BYTES);
        let max = read(ENV_MAX_BYTES);
        match (min, max) {
            (Some(min), Some(max)) => {
                config.min_bytes = min;
                config.max_bytes = max;
            },
            // Only the floor given: keep the default 2x ratio
            (Some(min), None) => {
                config.min_bytes = min;
                config.max_bytes = min.saturating_mul(2);
            },
            (None, Some(max)) => {
                config.max_bytes = max;
                config.min_bytes = config.min_bytes.min(max / 2);
            },
            (None, None) => {},
        }

        if let Err(e) = config.validate() {
            log::warn!("{}; falling back to default budget", e);
            config.min_bytes = DEFAULT_MIN_BYTES;
            config.max_bytes = DEFAULT_MAX_BYTES;
        }
        config
    }

    /// Checks `min_bytes <= max_bytes` and `max_bytes > 0`
    pub fn validate(&self) -> Result<()> {
        validate_budget(self.min_bytes, self.max_bytes)
    }
}

pub(crate) fn validate_budget(min: usize, max: usize) -> Result<()> {
    if max == 0 || min > max {
        return Err(GlyphCacheError::InvalidBudget { min, max });
    }
    Ok(())
}

/// Parses "1024", "64K", "8M", "1G" (case-insensitive, optional "iB"/"B")
pub fn parse_byte_size(raw: &str) -> Option<usize> {
    let s = raw.trim().to_ascii_uppercase();
    let s = s
        .strip_suffix("IB")
        .or_else(|| s.strip_suffix('B'))
        .unwrap_or(&s);
    let (digits, shift) = match s.chars().last()? {
        'K' => (&s[..s.len() - 1], 10),
        'M' => (&s[..s.len() - 1], 20),
        'G' => (&s[..s.len() - 1], 30),
        _ => (s, 0),
    };
    let value: usize = digits.trim().parse().ok()?;
    value.checked_mul(1usize << shift)
}
