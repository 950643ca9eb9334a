//! Firmware content digests
//!
//! ESP8266 OTA clients report the MD5 of the sketch they are running, so the
//! stored digest uses the same algorithm and the same lowercase hex form.

use md5::{Digest, Md5};

/// Compute the MD5 digest of a payload as lowercase hex
pub fn digest(payload: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

/// Check a payload against a previously computed digest
pub fn verify(payload: &[u8], expected: &str) -> bool {
    digest(payload) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_values() {
        assert_eq!(digest(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_digest_is_stable() {
        let payload = vec![0x5Au8; 4096];
        let first = digest(&payload);
        assert_eq!(first, digest(&payload));
        assert_eq!(first.len(), 32); // MD5 = 16 bytes = 32 hex chars
        assert!(first.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_verify() {
        let payload = [0x01, 0x02, 0x03];
        let hash = digest(&payload);
        assert!(verify(&payload, &hash));
        assert!(!verify(&payload, &hash.to_uppercase()));
        assert!(!verify(&[0x01, 0x02], &hash));
    }
}
