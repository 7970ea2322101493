//! Fixed test vectors.
//!
//! The index pairs are ten ascending values, each mapped to an ascending
//! item key, so ordering assertions can be written by position. The
//! encoding vectors pin the byte layout of sortable numbers and key text.

use ordex_core::key;
use serde::{Deserialize, Serialize};

/// Canonical text of the ten fixture item keys, in ascending order.
pub const ITEMS: [&str; 10] = [
    "01B8NDW533F20DBGJVEDSHW3BZ",
    "01B8NDW533J6NQMYM9T10B1K3C",
    "01B8NDW533KBPAZ0NDHEKWEDRX",
    "01B8NDW533MP71DEHZD7AV97D1",
    "01B8NDW533SKQ86B97Y8H888C8",
    "01B8NDW533SKRR70MF8F7548MH",
    "01B8NDW533TSVGB126Q71TSQBY",
    "01B8NDW533WWDAKNXKDRJ87RTZ",
    "01B8NDW533Z1X4VPV9AJ6F0SDM",
    "01B8NE6WJ0MJ8N4QQAJZ6GNG7S",
];

/// The ten fixture values, in ascending order.
pub const VALUES: [&str; 10] = [
    "aa zero", "bb one", "cc two", "dd three", "ee four", "ff five", "gg six", "hh seven",
    "ii eight", "jj nine",
];

/// Extra `(value, items)` pairs for non-unique scenarios: value 1 also
/// holds items 2-4 and value 3 also holds items 4 and 6.
pub const REPEATS: [(usize, &[usize]); 2] = [(1, &[2, 3, 4]), (3, &[4, 6])];

/// Raw bytes of fixture item `i`.
pub fn item(i: usize) -> Vec<u8> {
    key::key_from_string(ITEMS[i])
}

/// Raw bytes of fixture value `i`.
pub fn value(i: usize) -> Vec<u8> {
    VALUES[i].as_bytes().to_vec()
}

/// A test vector that can be shared with other implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input, as text or decimal.
    pub input: String,
    /// Expected output bytes (hex-encoded).
    pub expected_hex: String,
}

fn vector(id: &str, description: &str, input: &str, expected_hex: &str) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input: input.into(),
        expected_hex: expected_hex.into(),
    }
}

/// Sortable integer encoding vectors. Inputs are decimal `i64`s.
pub fn number_vectors() -> Vec<TestVector> {
    vec![
        vector("num_zero", "Zero", "0", "0000000000000000"),
        vector("num_one", "One", "1", "0000000000000001"),
        vector("num_256", "Carry into second byte", "256", "0000000000000100"),
        vector("num_neg_one", "Minus one", "-1", "ffffffffffffffff"),
        vector("num_min", "Smallest i64", "-9223372036854775808", "8000000000000000"),
        vector("num_max", "Largest i64", "9223372036854775807", "7fffffffffffffff"),
    ]
}

/// Item key text vectors.
pub fn key_text_vectors() -> Vec<TestVector> {
    vec![
        vector(
            "key_zero",
            "All-zero sentinel",
            "00000000000000000000000000",
            "00000000000000000000000000000000",
        ),
        vector(
            "key_max",
            "All-ones sentinel",
            "7ZZZZZZZZZZZZZZZZZZZZZZZZZ",
            "ffffffffffffffffffffffffffffffff",
        ),
        vector(
            "key_raw",
            "Text that is not a key passes through as bytes",
            "bb one",
            "6262206f6e65",
        ),
    ]
}

/// Non-unique composite key vectors. Inputs are `value|item-text`.
pub fn composite_key_vectors() -> Vec<TestVector> {
    vec![vector(
        "composite_zero",
        "Value, separator, then the item bytes",
        "ab|00000000000000000000000000",
        "6162ff00000000000000000000000000000000",
    )]
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes lowercase or uppercase hex.
///
/// # Panics
///
/// Panics on odd length or non-hex characters.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "Odd hex length");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

/// Generate all test vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        number: number_vectors(),
        key_text: key_text_vectors(),
        composite_key: composite_key_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    number: Vec<TestVector>,
    key_text: Vec<TestVector>,
    composite_key: Vec<TestVector>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordex_core::encoding;
    use ordex_core::index::composite_key;

    #[test]
    fn test_fixture_pairs_ascend() {
        for i in 1..ITEMS.len() {
            assert!(item(i - 1) < item(i));
            assert!(value(i - 1) < value(i));
            assert_eq!(item(i).len(), key::KEY_LEN);
        }
    }

    #[test]
    fn test_number_vectors() {
        for vector in number_vectors() {
            let n: i64 = vector.input.parse().unwrap();
            let encoded = encoding::number_to_bytes(&n).unwrap();
            assert_eq!(hex_encode(&encoded), vector.expected_hex, "{}", vector.id);
            assert_eq!(encoding::number_from_bytes(&encoded).unwrap(), n);
        }
    }

    #[test]
    fn test_key_text_vectors() {
        for vector in key_text_vectors() {
            let raw = key::key_from_string(&vector.input);
            assert_eq!(hex_encode(&raw), vector.expected_hex, "{}", vector.id);
            assert_eq!(key::key_to_string(&raw), vector.input, "{}", vector.id);
        }
    }

    #[test]
    fn test_composite_key_vectors() {
        for vector in composite_key_vectors() {
            let (value, item) = vector.input.split_once('|').unwrap();
            let raw = composite_key(value.as_bytes(), &key::key_from_string(item));
            assert_eq!(raw, hex_decode(&vector.expected_hex), "{}", vector.id);
        }
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        assert!(json.contains("number"));
        assert!(json.contains("key_text"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["number"].as_array().unwrap().len(), 6);
    }
}
