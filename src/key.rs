//! Key generation and text-size tier classification.
//!
//! Keys are content-addressed: short text is embedded inline, longer text
//! is replaced with a SHA-256 digest so the key stays bounded regardless
//! of input size. Tier classification buckets text by length so the
//! cache can apply different promotion rules to short vs. long inputs.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::TextSizeTiers;
use crate::value::Value;

pub const KEY_NAMESPACE: &str = "ai_cache";

/// Text-size tier used to choose caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TextTier {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl TextTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TextTier::Small => "small",
            TextTier::Medium => "medium",
            TextTier::Large => "large",
            TextTier::Xlarge => "xlarge",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "small" => Some(TextTier::Small),
            "medium" => Some(TextTier::Medium),
            "large" => Some(TextTier::Large),
            "xlarge" => Some(TextTier::Xlarge),
            _ => None,
        }
    }
}

/// Classifies text by length into the four size tiers using strictly
/// ascending thresholds. Grounded on `_get_text_tier`.
#[must_use]
pub fn classify_tier(text: &str, tiers: &TextSizeTiers) -> TextTier {
    let len = text.chars().count();
    if len < tiers.small {
        TextTier::Small
    } else if len < tiers.medium {
        TextTier::Medium
    } else if len < tiers.large {
        TextTier::Large
    } else {
        TextTier::Xlarge
    }
}

/// Builds and parses content-addressed AI cache keys.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    text_hash_threshold: usize,
    text_size_tiers: TextSizeTiers,
}

impl KeyGenerator {
    #[must_use]
    pub fn new(text_hash_threshold: usize, text_size_tiers: TextSizeTiers) -> Self {
        Self {
            text_hash_threshold,
            text_size_tiers,
        }
    }

    /// Build a cache key of the form
    /// `ai_cache:op:<operation>|tier:<tier>|txt:<text-or-hash>|opts:<hash>`.
    ///
    /// Text no longer than `text_hash_threshold` characters is embedded
    /// inline; longer text is replaced with a `hash:<sha256 hex>` digest so
    /// the key stays bounded regardless of input size. Options are
    /// serialized with sorted keys so equivalent option maps always
    /// produce the same key, then hashed to an 8 hex-character tag.
    #[must_use]
    pub fn generate_cache_key(&self, text: &str, operation: &str, options: &Value) -> String {
        let tier = classify_tier(text, &self.text_size_tiers);
        let txt_field = if text.chars().count() > self.text_hash_threshold {
            format!("hash:{}", hex_sha256(text.as_bytes()))
        } else {
            text.to_string()
        };
        let opts_hash = &hex_sha256(stable_options_bytes(options).as_slice())[..8];

        format!(
            "{KEY_NAMESPACE}:op:{operation}|tier:{}|txt:{txt_field}|opts:{opts_hash}",
            tier.as_str()
        )
    }

    /// Extract the embedded text tier from a key, falling back to
    /// inferring it from embedded un-hashed text, then `"unknown"`.
    /// Grounded on `_get_text_tier_from_key`.
    #[must_use]
    pub fn tier_from_key(&self, key: &str) -> String {
        if let Some(rest) = key.split("|tier:").nth(1) {
            let candidate = rest.split('|').next().unwrap_or_default();
            if let Some(tier) = TextTier::from_str(candidate) {
                return tier.as_str().to_string();
            }
        }

        if let Some(rest) = key.split("|txt:").nth(1) {
            let text_part = rest.split('|').next().unwrap_or_default();
            if !text_part.starts_with("hash:") {
                return classify_tier(text_part, &self.text_size_tiers)
                    .as_str()
                    .to_string();
            }
        }

        let lowered = key.to_lowercase();
        for tier in [
            TextTier::Small,
            TextTier::Medium,
            TextTier::Large,
            TextTier::Xlarge,
        ] {
            if lowered.contains(tier.as_str()) {
                return tier.as_str().to_string();
            }
        }

        "unknown".to_string()
    }
}

/// Extract the operation name from a key, supporting both `:op:` and
/// `|op:` separators. Returns `"unknown"` for anything that doesn't parse
/// as an alphanumeric-plus-underscore identifier. Grounded on
/// `_extract_operation_from_key`.
#[must_use]
pub fn operation_from_key(key: &str) -> String {
    for separator in [":op:", "|op:"] {
        if let Some(rest) = key.split(separator).nth(1) {
            let candidate = rest.split('|').next().unwrap_or_default();
            if is_valid_identifier(candidate) {
                return candidate.to_string();
            }
        }
    }
    "unknown".to_string()
}

fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Serialize options with sorted keys so semantically-equal maps always
/// hash to the same bytes regardless of insertion order.
fn stable_options_bytes(options: &Value) -> Vec<u8> {
    fn stable_json(value: &Value) -> serde_json::Value {
        match value {
            Value::Map(map) => {
                let sorted: BTreeMap<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), stable_json(v)))
                    .collect();
                serde_json::to_value(sorted).unwrap_or(serde_json::Value::Null)
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(stable_json).collect())
            }
            other => other.clone().into(),
        }
    }

    serde_json::to_vec(&stable_json(options)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TextSizeTiers {
        TextSizeTiers {
            small: 10,
            medium: 100,
            large: 1_000,
        }
    }

    #[test]
    fn classifies_text_by_ascending_thresholds() {
        let t = tiers();
        assert_eq!(classify_tier("short", &t), TextTier::Small);
        assert_eq!(classify_tier(&"a".repeat(50), &t), TextTier::Medium);
        assert_eq!(classify_tier(&"a".repeat(500), &t), TextTier::Large);
        assert_eq!(classify_tier(&"a".repeat(5_000), &t), TextTier::Xlarge);
    }

    #[test]
    fn short_text_is_embedded_inline_in_the_key() {
        let gen = KeyGenerator::new(1_000, TextSizeTiers::default());
        let key = gen.generate_cache_key("Sample text", "summarize", &Value::Null);
        assert!(key.contains("txt:Sample text"));
        assert!(key.starts_with("ai_cache:op:summarize|tier:small|"));
    }

    #[test]
    fn long_text_is_hashed_in_the_key() {
        let gen = KeyGenerator::new(10, TextSizeTiers::default());
        let key = gen.generate_cache_key(&"x".repeat(50), "summarize", &Value::Null);
        assert!(key.contains("txt:hash:"));
        assert!(!key.contains(&"x".repeat(50)));
    }

    #[test]
    fn options_with_different_insertion_order_hash_identically() {
        let gen = KeyGenerator::new(1_000, TextSizeTiers::default());
        let a = Value::Map(BTreeMap::from([
            ("b".to_string(), Value::Number(2.0)),
            ("a".to_string(), Value::Number(1.0)),
        ]));
        let b = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::Number(2.0)),
        ]));
        let key_a = gen.generate_cache_key("t", "op", &a);
        let key_b = gen.generate_cache_key("t", "op", &b);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn tier_from_key_reads_embedded_field() {
        let gen = KeyGenerator::new(1_000, TextSizeTiers::default());
        let key = gen.generate_cache_key(&"x".repeat(60_000), "op", &Value::Null);
        assert_eq!(gen.tier_from_key(&key), "xlarge");
    }

    #[test]
    fn tier_from_key_falls_back_to_unknown_for_malformed_key() {
        let gen = KeyGenerator::new(1_000, TextSizeTiers::default());
        assert_eq!(gen.tier_from_key("not_a_valid_key"), "unknown");
    }

    #[test]
    fn operation_from_key_supports_both_separator_styles() {
        assert_eq!(
            operation_from_key("ai_cache:op:summarize|tier:small|txt:x|opts:y"),
            "summarize"
        );
        assert_eq!(operation_from_key("prefix|op:sentiment|suffix"), "sentiment");
        assert_eq!(operation_from_key("no operation here"), "unknown");
    }
}
