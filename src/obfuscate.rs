//! Reversible obfuscation of serialized entries.
//!
//! This is not encryption. It keeps casual readers of the storage medium from
//! reading values at a glance, nothing more.

use crate::error::StoreError;

/// A reversible string transform keyed by a secret.
pub trait Obfuscator: Send + Sync {
    /// Transforms `plaintext` into an opaque string.
    fn apply(&self, plaintext: &str, secret: &str) -> String;

    /// Reverses [`Obfuscator::apply`]. Fails if `opaque` was not produced by
    /// this transform with the same secret.
    fn invert(&self, opaque: &str, secret: &str) -> Result<String, StoreError>;
}

/// XORs the UTF-8 bytes with the repeated secret and hex encodes the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorObfuscator;

impl XorObfuscator {
    fn xor(bytes: &mut [u8], secret: &[u8]) {
        if secret.is_empty() {
            return;
        }
        for (byte, key) in bytes.iter_mut().zip(secret.iter().cycle()) {
            *byte ^= key;
        }
    }
}

impl Obfuscator for XorObfuscator {
    fn apply(&self, plaintext: &str, secret: &str) -> String {
        let mut bytes = plaintext.as_bytes().to_vec();
        Self::xor(&mut bytes, secret.as_bytes());

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
        out
    }

    fn invert(&self, opaque: &str, secret: &str) -> Result<String, StoreError> {
        let digits = opaque.as_bytes();
        if digits.len() % 2 != 0 {
            return Err(StoreError::Obfuscation("odd number of hex digits".into()));
        }

        let mut bytes = digits
            .chunks_exact(2)
            .map(|pair| -> Result<u8, StoreError> {
                Ok(hex_value(pair[0])? << 4 | hex_value(pair[1])?)
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::xor(&mut bytes, secret.as_bytes());

        String::from_utf8(bytes).map_err(|e| StoreError::Obfuscation(e.to_string()))
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn hex_value(digit: u8) -> Result<u8, StoreError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(StoreError::Obfuscation(format!(
            "invalid hex digit {:?}",
            digit as char
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let codec = XorObfuscator;
        let plain = r#"{"value":"héllo","expiry":123}"#;
        let opaque = codec.apply(plain, "s3cret");

        assert_ne!(opaque, plain);
        assert!(!opaque.contains("value"));
        assert_eq!(codec.invert(&opaque, "s3cret").unwrap(), plain);
    }

    #[test]
    fn test_invert_rejects_garbage() {
        let codec = XorObfuscator;
        assert!(codec.invert("abc", "key").is_err());
        assert!(codec.invert("zz", "key").is_err());
        assert!(codec.invert(r#"{"value":1}"#, "key").is_err());
    }

    #[test]
    fn test_wrong_secret_does_not_restore_plaintext() {
        let codec = XorObfuscator;
        let plain = r#"{"value":1}"#;
        let opaque = codec.apply(plain, "right");
        assert_ne!(codec.invert(&opaque, "wrong").ok().as_deref(), Some(plain));
    }
}
