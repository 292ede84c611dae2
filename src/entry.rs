//! Entry record and its string codec.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;

/// One stored value with its optional expiry.
///
/// Serialized as `{"value": <json>, "expiry": <epoch ms>}`. The `expiry`
/// field is omitted for entries without a TTL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: serde_json::Value,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<i64>, // UNIX timestamp (milliseconds)
}

impl Entry {
    pub fn new(value: serde_json::Value, expiry: Option<i64>) -> Self {
        Self { value, expiry }
    }

    /// Expiry is strict: an entry is still live during its expiry millisecond.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry.is_some_and(|expiry| now > expiry)
    }

    pub fn encode(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parses a record. Any failure is reported as `MalformedEntry`.
    pub fn decode(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::MalformedEntry(e.to_string()))
    }
}

// Other writers may store a fractional expiry. Flooring keeps `now > expiry`
// unchanged for whole-millisecond `now`.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match number.as_i64() {
        Some(millis) => Ok(Some(millis)),
        None => number
            .as_f64()
            .map(|millis| Some(millis.floor() as i64))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid expiry {number}"))),
    }
}

/// Computes the expiry instant for a TTL given in (possibly fractional or
/// negative) seconds. A NaN TTL yields no expiry.
pub fn expiry_after(now: i64, ttl_secs: f64) -> Option<i64> {
    if ttl_secs.is_nan() {
        return None;
    }
    Some(now.saturating_add((ttl_secs * 1000.0).floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_omits_missing_expiry() {
        let raw = Entry::new(json!("alice"), None).encode().unwrap();
        assert_eq!(raw, r#"{"value":"alice"}"#);

        let raw = Entry::new(json!(42), Some(1_000)).encode().unwrap();
        assert_eq!(raw, r#"{"value":42,"expiry":1000}"#);
    }

    #[test]
    fn test_decode() {
        let entry = Entry::decode(r#"{"value":{"a":[1,2]},"expiry":5}"#).unwrap();
        assert_eq!(entry.value, json!({"a": [1, 2]}));
        assert_eq!(entry.expiry, Some(5));

        let entry = Entry::decode(r#"{"value":null}"#).unwrap();
        assert_eq!(entry.value, serde_json::Value::Null);
        assert_eq!(entry.expiry, None);
    }

    #[test]
    fn test_decode_fractional_expiry() {
        let entry = Entry::decode(r#"{"value":1,"expiry":5000.5}"#).unwrap();
        assert_eq!(entry.expiry, Some(5_000));
        assert!(!entry.is_expired(5_000));
        assert!(entry.is_expired(5_001));

        let entry = Entry::decode(r#"{"value":1,"expiry":null}"#).unwrap();
        assert_eq!(entry.expiry, None);
        assert_eq!(entry.encode().unwrap(), r#"{"value":1}"#);
    }

    #[test]
    fn test_decode_malformed() {
        for raw in ["", "not json", "42", r#"{"expiry":5}"#, r#"{"value":1,"expiry":"soon"}"#] {
            let err = Entry::decode(raw).unwrap_err();
            assert!(matches!(err, StoreError::MalformedEntry(_)), "{raw}");
        }
    }

    #[test]
    fn test_expiry_is_strict() {
        let entry = Entry::new(json!(1), Some(100));
        assert!(!entry.is_expired(99));
        assert!(!entry.is_expired(100));
        assert!(entry.is_expired(101));

        let forever = Entry::new(json!(1), None);
        assert!(!forever.is_expired(i64::MAX));
    }

    #[test]
    fn test_expiry_after() {
        assert_eq!(expiry_after(1_000, 2.0), Some(3_000));
        assert_eq!(expiry_after(1_000, 0.0), Some(1_000));
        assert_eq!(expiry_after(1_000, -1.0), Some(0));
        assert_eq!(expiry_after(1_000, 0.0015), Some(1_001));
        assert_eq!(expiry_after(1_000, f64::NAN), None);
        // Sub-millisecond negative TTLs must still land in the past.
        assert_eq!(expiry_after(1_000, -0.0005), Some(999));
        assert_eq!(expiry_after(1_000, -1.0005), Some(-1));
    }
}
