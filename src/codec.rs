//! Encoding of configurations to their persisted byte form.
//!
//! The manager never looks inside the bytes it writes. It only relies on two
//! properties of a codec: decoding what was encoded yields an equal value, and
//! encoding the same value twice yields the same bytes.

use serde::{Serialize, de::DeserializeOwned};

/// Errors produced while encoding or decoding a configuration.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Content is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// TOML content could not be parsed
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Value could not be represented as TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON content could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Converts a configuration to bytes and back.
pub trait Codec<C>: Send + Sync {
    /// Encodes `config` to its persisted representation.
    ///
    /// # Errors
    /// Returns `CodecError` if the value cannot be represented in this format.
    fn encode(&self, config: &C) -> Result<Vec<u8>, CodecError>;

    /// Decodes a configuration from its persisted representation.
    ///
    /// # Errors
    /// Returns `CodecError` if the bytes are not a valid encoding.
    fn decode(&self, bytes: &[u8]) -> Result<C, CodecError>;
}

/// Pretty-printed TOML. This is the default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl<C> Codec<C> for TomlCodec
where
    C: Serialize + DeserializeOwned,
{
    fn encode(&self, config: &C) -> Result<Vec<u8>, CodecError> {
        Ok(toml::to_string_pretty(config)?.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<C, CodecError> {
        let content = std::str::from_utf8(bytes)?;
        Ok(toml::from_str(content)?)
    }
}

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<C> Codec<C> for JsonCodec
where
    C: Serialize + DeserializeOwned,
{
    fn encode(&self, config: &C) -> Result<Vec<u8>, CodecError> {
        let mut bytes = serde_json::to_vec_pretty(config)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<C, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        version: u64,
        name: String,
        nested: Option<Inner>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        flag: bool,
        items: Vec<i64>,
    }

    fn sample() -> Sample {
        Sample {
            version: 7,
            name: "primary".to_string(),
            nested: Some(Inner {
                flag: true,
                items: vec![1, 2, 3],
            }),
        }
    }

    #[test]
    fn toml_round_trip_preserves_value() {
        let bytes = TomlCodec.encode(&sample()).unwrap();
        let decoded: Sample = TomlCodec.decode(&bytes).unwrap();

        assert_eq!(decoded, sample());
    }

    #[test]
    fn json_round_trip_preserves_value() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        let decoded: Sample = JsonCodec.decode(&bytes).unwrap();

        assert_eq!(decoded, sample());
    }

    #[test]
    fn encoding_is_stable() {
        let first = TomlCodec.encode(&sample()).unwrap();
        let decoded: Sample = TomlCodec.decode(&first).unwrap();
        let second = TomlCodec.encode(&decoded).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let result: Result<Sample, _> = TomlCodec.decode(b"version = [unterminated");

        assert!(matches!(result, Err(CodecError::Toml(_))));
    }

    #[test]
    fn invalid_utf8_is_rejected_not_replaced() {
        let result: Result<Sample, _> = TomlCodec.decode(b"version = 1\nname = \"caf\xE9\"\n");

        assert!(matches!(result, Err(CodecError::Utf8(_))));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result: Result<Sample, _> = JsonCodec.decode(b"{\"version\": ");

        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
