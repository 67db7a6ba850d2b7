//! Domain identifier types with validation
//!
//! Newtype wrappers for the two kinds of identifiers the migration juggles:
//! opaque source identifiers coming out of the Papers3 export, and the
//! fixed-format object keys the Zotero sync protocol requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters allowed in a Zotero object key.
///
/// This is the destination system's own alphabet: upper-case letters and
/// digits without `0`, `1` and `O`.
pub const KEY_ALPHABET: &[u8] = b"23456789ABCDEFGHIJKLMNPQRSTUVWXYZ";

/// Length of every Zotero object key.
pub const KEY_LENGTH: usize = 8;

/// Returns true if `token` has the key length and only alphabet characters.
///
/// This checks format only, not uniqueness.
///
/// # Examples
///
/// ```
/// use papers3_zotero::domain::ids::is_valid_key;
///
/// assert!(is_valid_key("ABCD2345"));
/// assert!(!is_valid_key("ABCD0345"));
/// assert!(!is_valid_key("ABC"));
/// ```
pub fn is_valid_key(token: &str) -> bool {
    token.len() == KEY_LENGTH && token.bytes().all(|b| KEY_ALPHABET.contains(&b))
}

/// Source identifier newtype wrapper
///
/// The `uuid` of a publication or collection in the Papers3 export. Opaque
/// and globally unique within the source library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Creates a new SourceId, rejecting blank identifiers
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Source identifier cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Zotero object key newtype wrapper
///
/// An 8-character token from [`KEY_ALPHABET`]. A value of this type is always
/// well-formed; whether it is unique is the key generator's concern.
///
/// # Examples
///
/// ```
/// use papers3_zotero::domain::ids::ItemKey;
///
/// let key = ItemKey::new("X7K9M2PQ").unwrap();
/// assert_eq!(key.as_str(), "X7K9M2PQ");
/// assert!(ItemKey::new("x7k9m2pq").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Creates a new ItemKey, validating length and alphabet
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(format!(
                "Invalid key '{key}': expected {KEY_LENGTH} characters from {}",
                String::from_utf8_lossy(KEY_ALPHABET)
            ));
        }
        Ok(Self(key))
    }

    /// Wraps a token the caller built from the alphabet itself
    pub(crate) fn from_generated(key: String) -> Self {
        debug_assert!(is_valid_key(&key));
        Self(key)
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ItemKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("23456789" ; "all digits")]
    #[test_case("ABCDEFGH" ; "letters")]
    #[test_case("ZZZZZZZZ" ; "repeated")]
    #[test_case("LIY2K9QX" ; "ambiguous looking but allowed")]
    fn test_valid_keys(token: &str) {
        assert!(is_valid_key(token));
        assert!(ItemKey::new(token).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("ABCDEFG" ; "too short")]
    #[test_case("ABCDEFGHJ" ; "too long")]
    #[test_case("ABCDEFG0" ; "zero")]
    #[test_case("ABCDEFG1" ; "one")]
    #[test_case("ABCDEFGO" ; "letter o")]
    #[test_case("abcdefgh" ; "lower case")]
    #[test_case("ABCD-FGH" ; "punctuation")]
    #[test_case("ABCDÉFGH" ; "non ascii")]
    fn test_invalid_keys(token: &str) {
        assert!(!is_valid_key(token));
        assert!(ItemKey::new(token).is_err());
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        assert_eq!(KEY_ALPHABET.len(), 33);
        for excluded in [b'0', b'1', b'O'] {
            assert!(!KEY_ALPHABET.contains(&excluded));
        }
    }

    #[test]
    fn test_item_key_serde_rejects_malformed() {
        let ok: ItemKey = serde_json::from_str("\"ABCD2345\"").unwrap();
        assert_eq!(ok.as_str(), "ABCD2345");
        assert!(serde_json::from_str::<ItemKey>("\"ABCD0345\"").is_err());
    }

    #[test]
    fn test_source_id_creation() {
        let id = SourceId::new("6A1E4C1F-0B5D-4F0B-9F38-6C1D0E3B2A11").unwrap();
        assert_eq!(id.as_str(), "6A1E4C1F-0B5D-4F0B-9F38-6C1D0E3B2A11");
        assert_eq!(format!("{id}"), "6A1E4C1F-0B5D-4F0B-9F38-6C1D0E3B2A11");
    }

    #[test]
    fn test_source_id_empty_fails() {
        assert!(SourceId::new("").is_err());
        assert!(SourceId::new("   ").is_err());
    }
}
