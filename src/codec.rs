//! Data file codec
//!
//! Translates between the in-memory [`Mapping`] and the bytes of `data.json`.
//!
//! ## File Format
//! ```text
//! {
//!   "<base64url(key)>": "<base64url(value)>",
//!   ...
//! }
//! ```
//!
//! Keys and values are wrapped in URL-safe base64 (RFC 4648 §5) so arbitrary
//! bytes, including invalid UTF-8, quotes and backslashes, fit in JSON strings.
//! Encoding always pads; decoding accepts padded and unpadded text.

use std::collections::{BTreeMap, HashMap};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::{FlatKvError, Result};

/// Key → value content of a store at one point in time
pub type Mapping = HashMap<Vec<u8>, Vec<u8>>;

/// URL-safe alphabet, padded on encode, padding optional on decode
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// =============================================================================
// Encoding
// =============================================================================

/// Encode a mapping into the bytes of the data file
///
/// Members are written in sorted order of their encoded key, so the same
/// mapping always produces the same file.
pub fn encode(mapping: &Mapping) -> Result<Vec<u8>> {
    let encoded: BTreeMap<String, String> = mapping
        .iter()
        .map(|(key, value)| (BASE64.encode(key), BASE64.encode(value)))
        .collect();

    serde_json::to_vec(&encoded).map_err(|e| FlatKvError::Encoding(e.to_string()))
}

/// Bytes of a data file holding no entries
pub fn empty() -> Result<Vec<u8>> {
    encode(&Mapping::new())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the bytes of a data file into a mapping
///
/// Fails without returning any entries if the JSON is malformed, the top
/// level is not an object of strings, any name or value is not base64, or
/// two names decode to the same key.
pub fn decode(bytes: &[u8]) -> Result<Mapping> {
    let encoded: HashMap<String, String> =
        serde_json::from_slice(bytes).map_err(|e| FlatKvError::Decoding(e.to_string()))?;

    let mut mapping = Mapping::with_capacity(encoded.len());

    for (encoded_key, encoded_value) in encoded {
        let key = decode_text(&encoded_key, "key")?;
        let value = decode_text(&encoded_value, "value")?;

        // "YQ" and "YQ==" are both "a"
        if mapping.insert(key, value).is_some() {
            return Err(FlatKvError::Decoding(format!(
                "duplicate key after decoding member '{}'",
                encoded_key
            )));
        }
    }

    Ok(mapping)
}

fn decode_text(text: &str, what: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text)
        .map_err(|e| FlatKvError::Decoding(format!("invalid base64 in {} '{}': {}", what, text, e)))
}
