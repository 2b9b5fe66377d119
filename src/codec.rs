//! Codec — bidirectional value<->bytes transformation with a small-payload
//! fast path.
//!
//! Small values take a JSON fast path; larger ones go through `bincode`,
//! compressed with `flate2` zlib once they cross a size threshold.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::value::Value;

const PREFIX_COMPRESSED: &[u8] = b"compressed:";
const PREFIX_RAW: &[u8] = b"raw:";
const PREFIX_RAWJ: &[u8] = b"rawj:";

/// Emitted when `encode` actually compressed the payload, so the caller can
/// forward the event to the performance monitor without the codec itself
/// depending on it.
#[derive(Debug, Clone, Copy)]
pub struct CompressionEvent {
    pub original_size: usize,
    pub compressed_size: usize,
    pub elapsed: std::time::Duration,
}

#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub bytes: Vec<u8>,
    pub compression: Option<CompressionEvent>,
}

/// Serializes and optionally compresses [`Value`]s for the remote store.
#[derive(Debug, Clone)]
pub struct Codec {
    compression_threshold: usize,
    compression_level: u32,
}

impl Codec {
    #[must_use]
    pub fn new(compression_threshold: usize, compression_level: u32) -> Self {
        Self {
            compression_threshold,
            compression_level: compression_level.clamp(1, 9),
        }
    }

    /// Encode `value`: JSON fast path under threshold for scalars/sequences/
    /// mappings, else `bincode`, compressed with zlib once the binary form
    /// crosses the threshold.
    ///
    /// `Value::Bytes` never takes the JSON fast path (spec §4.2's step 1 is
    /// scoped to "a scalar, sequence, or mapping" — the glossary lists
    /// `bytes` as its own category) and its JSON form (an array of byte
    /// numbers) can't round-trip back to `Bytes` anyway, since [`Value`]'s
    /// `serde_json::Value` conversion has no array-of-numbers-to-bytes
    /// inference.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON or binary serialization fails.
    pub fn encode(&self, value: &Value) -> Result<EncodeOutcome> {
        if !matches!(value, Value::Bytes(_)) {
            let json: serde_json::Value = value.clone().into();
            let json_bytes = serde_json::to_vec(&json).context("serializing value to JSON")?;

            if json_bytes.len() <= self.compression_threshold {
                let mut bytes = PREFIX_RAWJ.to_vec();
                bytes.extend_from_slice(&json_bytes);
                return Ok(EncodeOutcome {
                    bytes,
                    compression: None,
                });
            }
        }

        let binary = bincode::serialize(value).context("serializing value to bincode")?;
        let original_size = binary.len();

        if original_size > self.compression_threshold {
            let start = std::time::Instant::now();
            let mut encoder =
                ZlibEncoder::new(Vec::new(), Compression::new(self.compression_level));
            encoder
                .write_all(&binary)
                .context("writing to zlib encoder")?;
            let compressed = encoder.finish().context("finishing zlib compression")?;
            let elapsed = start.elapsed();
            let compressed_size = compressed.len();

            let mut bytes = PREFIX_COMPRESSED.to_vec();
            bytes.extend_from_slice(&compressed);
            return Ok(EncodeOutcome {
                bytes,
                compression: Some(CompressionEvent {
                    original_size,
                    compressed_size,
                    elapsed,
                }),
            });
        }

        let mut bytes = PREFIX_RAW.to_vec();
        bytes.extend_from_slice(&binary);
        Ok(EncodeOutcome {
            bytes,
            compression: None,
        })
    }

    /// Decode bytes produced by [`Codec::encode`], or a legacy unprefixed
    /// payload, back into a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an error if no decoding strategy succeeds.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        if let Some(body) = bytes.strip_prefix(PREFIX_COMPRESSED) {
            let mut decoder = ZlibDecoder::new(body);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .context("decompressing zlib payload")?;
            return bincode::deserialize(&decompressed).context("deserializing bincode payload");
        }

        if let Some(body) = bytes.strip_prefix(PREFIX_RAW) {
            return bincode::deserialize(body).context("deserializing bincode payload");
        }

        if let Some(body) = bytes.strip_prefix(PREFIX_RAWJ) {
            let json: serde_json::Value =
                serde_json::from_slice(body).context("deserializing JSON payload")?;
            return Ok(Value::from(json));
        }

        // Legacy unprefixed payload: try binary first, then JSON.
        if let Ok(value) = bincode::deserialize::<Value>(bytes) {
            return Ok(value);
        }
        serde_json::from_slice::<serde_json::Value>(bytes)
            .map(Value::from)
            .context("decoding unrecognized payload as either bincode or JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn round_trips_small_values_via_json_fast_path() {
        let codec = Codec::new(1_000, 6);
        let value = Value::Map(BTreeMap::from([(
            "a".to_string(),
            Value::Number(1.0),
        )]));
        let outcome = codec.encode(&value).unwrap();
        assert!(outcome.bytes.starts_with(PREFIX_RAWJ));
        assert!(outcome.compression.is_none());
        assert_eq!(codec.decode(&outcome.bytes).unwrap(), value);
    }

    #[test]
    fn compresses_large_values_above_threshold() {
        let codec = Codec::new(100, 6);
        let value = Value::String("x".repeat(2_000));
        let outcome = codec.encode(&value).unwrap();
        assert!(outcome.bytes.starts_with(PREFIX_COMPRESSED));
        let event = outcome.compression.expect("expected a compression event");
        assert!(event.compressed_size < event.original_size);
        assert_eq!(codec.decode(&outcome.bytes).unwrap(), value);
    }

    #[test]
    fn legacy_unprefixed_payload_still_decodes() {
        let codec = Codec::new(1_000, 6);
        let value = Value::String("legacy".to_string());
        let legacy_bytes = bincode::serialize(&value).unwrap();
        assert_eq!(codec.decode(&legacy_bytes).unwrap(), value);
    }

    #[test]
    fn decode_of_garbage_bytes_fails() {
        let codec = Codec::new(1_000, 6);
        let err = codec.decode(b"\x00\x01\xff\xfe\xfd");
        assert!(err.is_err());
    }

    #[test]
    fn compression_ratio_is_between_zero_and_one() {
        let codec = Codec::new(10, 9);
        let value = Value::String("y".repeat(5_000));
        let outcome = codec.encode(&value).unwrap();
        let event = outcome.compression.unwrap();
        #[allow(clippy::cast_precision_loss)]
        let ratio = event.compressed_size as f64 / event.original_size as f64;
        assert!(ratio > 0.0 && ratio <= 1.0);
    }

    #[test]
    fn small_bytes_values_round_trip_through_the_binary_path_not_json() {
        // A JSON array of byte numbers would fit under the threshold and
        // decode back as Value::Array, not Value::Bytes — Bytes must always
        // skip the rawj: fast path.
        let codec = Codec::new(1_000, 6);
        for sample in [Vec::new(), vec![0u8], vec![1, 2, 3, 255, 0, 128]] {
            let value = Value::Bytes(sample);
            let outcome = codec.encode(&value).unwrap();
            assert!(
                !outcome.bytes.starts_with(PREFIX_RAWJ),
                "Value::Bytes must not take the rawj: fast path"
            );
            assert_eq!(codec.decode(&outcome.bytes).unwrap(), value);
        }
    }

    #[test]
    fn large_bytes_values_round_trip_through_compression() {
        let codec = Codec::new(100, 6);
        let value = Value::Bytes(vec![7u8; 2_000]);
        let outcome = codec.encode(&value).unwrap();
        assert!(outcome.bytes.starts_with(PREFIX_COMPRESSED));
        assert_eq!(codec.decode(&outcome.bytes).unwrap(), value);
    }
}
