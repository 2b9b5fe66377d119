//! Cache configuration shape.
//!
//! Parsing configuration from files or environment variables is out of
//! scope here — only the resulting shape and its validation rules matter.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::CacheError;

/// Text size tier thresholds, in characters. Strictly ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSizeTiers {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Default for TextSizeTiers {
    fn default() -> Self {
        Self {
            small: 500,
            medium: 5_000,
            large: 50_000,
        }
    }
}

/// Top-level cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis-compatible connection string (`redis://`, `rediss://`, `unix://`).
    pub remote_url: String,
    /// Default TTL applied when an operation doesn't specify one.
    pub default_ttl: Duration,
    pub l1_enabled: bool,
    pub l1_max_size: usize,
    pub compression_threshold: usize,
    pub compression_level: u32,
    pub text_hash_threshold: usize,
    pub text_size_tiers: TextSizeTiers,
    pub operation_ttls: BTreeMap<String, Duration>,
    pub retention: Duration,
    pub max_measurements: usize,
    pub memory_warning_bytes: u64,
    pub memory_critical_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            remote_url: "redis://127.0.0.1:6379".to_string(),
            default_ttl: Duration::from_secs(3600),
            l1_enabled: true,
            l1_max_size: 1_000,
            compression_threshold: 1_024,
            compression_level: 6,
            text_hash_threshold: 1_000,
            text_size_tiers: TextSizeTiers::default(),
            operation_ttls: default_operation_ttls(),
            retention: Duration::from_secs(3600),
            max_measurements: 1_000,
            memory_warning_bytes: 50 * 1024 * 1024,
            memory_critical_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Typical per-operation TTL defaults.
#[must_use]
pub fn default_operation_ttls() -> BTreeMap<String, Duration> {
    BTreeMap::from([
        ("summarize".to_string(), Duration::from_secs(7_200)),
        ("sentiment".to_string(), Duration::from_secs(86_400)),
        ("key_points".to_string(), Duration::from_secs(7_200)),
        ("questions".to_string(), Duration::from_secs(3_600)),
        ("qa".to_string(), Duration::from_secs(1_800)),
    ])
}

const ONE_YEAR_SECS: u64 = 31_536_000;

impl CacheConfig {
    /// Validate every field, accumulating *all* violations rather than
    /// failing on the first one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Configuration`] enumerating every violation if
    /// any field is out of range.
    pub fn validate(&self) -> Result<(), CacheError> {
        let mut violations = Vec::new();

        let has_valid_scheme = ["redis://", "rediss://", "unix://"]
            .iter()
            .any(|scheme| self.remote_url.starts_with(scheme));
        if !has_valid_scheme {
            violations.push(format!(
                "remote_url must start with redis://, rediss://, or unix:// (got '{}')",
                self.remote_url
            ));
        }

        let ttl_secs = self.default_ttl.as_secs();
        if !(1..=ONE_YEAR_SECS).contains(&ttl_secs) {
            violations.push(format!(
                "default_ttl must be between 1 and {ONE_YEAR_SECS} seconds (got {ttl_secs})"
            ));
        }

        if self.l1_max_size > 10_000 {
            violations.push(format!(
                "l1_max_size must be between 0 and 10000 (got {})",
                self.l1_max_size
            ));
        }

        if self.compression_threshold > 1_048_576 {
            violations.push(format!(
                "compression_threshold must be between 0 and 1048576 bytes (got {})",
                self.compression_threshold
            ));
        }

        if !(1..=9).contains(&self.compression_level) {
            violations.push(format!(
                "compression_level must be between 1 and 9 (got {})",
                self.compression_level
            ));
        }

        if !(1..=100_000).contains(&self.text_hash_threshold) {
            violations.push(format!(
                "text_hash_threshold must be between 1 and 100000 chars (got {})",
                self.text_hash_threshold
            ));
        }

        let tiers = &self.text_size_tiers;
        if !(tiers.small < tiers.medium && tiers.medium < tiers.large) {
            violations.push(format!(
                "text_size_tiers must be strictly ascending (small={}, medium={}, large={})",
                tiers.small, tiers.medium, tiers.large
            ));
        }

        for (op, ttl) in &self.operation_ttls {
            let secs = ttl.as_secs();
            if secs == 0 || secs > ONE_YEAR_SECS {
                violations.push(format!(
                    "operation_ttls['{op}'] must be positive and at most {ONE_YEAR_SECS}s (got {secs})"
                ));
            }
        }

        if self.max_measurements == 0 {
            violations.push("max_measurements must be positive".to_string());
        }
        if self.retention.is_zero() {
            violations.push("retention_hours must be positive".to_string());
        }
        if self.memory_warning_bytes == 0 {
            violations.push("memory_warning_bytes must be positive".to_string());
        }
        if self.memory_critical_bytes == 0 {
            violations.push("memory_critical_bytes must be positive".to_string());
        }
        if self.memory_critical_bytes < self.memory_warning_bytes {
            violations.push(
                "memory_critical_bytes must be >= memory_warning_bytes".to_string(),
            );
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Configuration(violations.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CacheConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_url_scheme_is_rejected() {
        let config = CacheConfig {
            remote_url: "http://example.com".to_string(),
            ..CacheConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
    }

    #[test]
    fn validation_accumulates_every_violation() {
        let config = CacheConfig {
            remote_url: "bogus".to_string(),
            default_ttl: Duration::from_secs(0),
            compression_level: 20,
            ..CacheConfig::default()
        };
        let err = config.validate().unwrap_err();
        let CacheError::Configuration(message) = err else {
            panic!("expected configuration error");
        };
        assert!(message.contains("remote_url"));
        assert!(message.contains("default_ttl"));
        assert!(message.contains("compression_level"));
    }

    #[test]
    fn non_ascending_tiers_are_rejected() {
        let config = CacheConfig {
            text_size_tiers: TextSizeTiers {
                small: 500,
                medium: 100,
                large: 50_000,
            },
            ..CacheConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
