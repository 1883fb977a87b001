//! SHA-256 derivations for the SEB config key and request hash

use sha2::{Digest, Sha256};

use crate::number::{to_number, to_uint32};
use crate::value::{Dictionary, Value};

/// Dictionary key holding the comma-separated exam key salt
pub const EXAM_KEY_SALT: &str = "examKeySalt";

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Hash of the canonical serialization
pub fn config_hash(serialized: &str) -> String {
    sha256_hex(serialized)
}

/// Salt words from `examKeySalt`; empty when missing, empty or not a string
pub fn exam_key_salt(dict: &Dictionary) -> Vec<u32> {
    match dict.get(EXAM_KEY_SALT) {
        Some(Value::String(salt)) if !salt.is_empty() => salt
            .split(',')
            .map(|piece| to_uint32(to_number(piece)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Hash of the comma-joined salt words
pub fn request_hash(dict: &Dictionary) -> String {
    let joined = exam_key_salt(dict)
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    sha256_hex(joined)
}

/// Config key for `url`: the URL concatenated with the config hash, hashed
pub fn config_key(url: &str, config_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(config_hash.as_bytes());
    hex::encode(hasher.finalize())
}
