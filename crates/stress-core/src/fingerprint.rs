//! Content fingerprints for derived signals
//!
//! A fingerprint is a SHA-256 digest over the exact bit patterns of a signal's
//! samples, in order. Any change to a value, to the ordering or to the length
//! produces a different key, so cached decompositions never need staleness
//! checks.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

const SIGNAL_DOMAIN: &[u8] = b"stress-analysis/signal/v1";

/// Deterministic digest of a signal's sample values
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint the samples of a signal
    pub fn of_signal(values: &[f64]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(SIGNAL_DOMAIN);
        hasher.update((values.len() as u64).to_le_bytes());
        for v in values {
            hasher.update(v.to_bits().to_le_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Derive a new fingerprint bound to additional context (e.g. the
    /// parameters a decomposition was computed with)
    pub fn salted(&self, salt: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(salt);
        Self(hasher.finalize().into())
    }

    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding (used as the on-disk cache file stem)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64 character hex string
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Seed for per-signal random number generation
    pub fn seed(&self) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(head)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let signal = vec![0.81, 0.82, 0.79, 0.80];
        assert_eq!(Fingerprint::of_signal(&signal), Fingerprint::of_signal(&signal));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = Fingerprint::of_signal(&[1.0, 2.0, 3.0]);
        let b = Fingerprint::of_signal(&[3.0, 2.0, 1.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_signed_zero() {
        let a = Fingerprint::of_signal(&[0.0]);
        let b = Fingerprint::of_signal(&[-0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_prefix() {
        let a = Fingerprint::of_signal(&[1.0, 2.0]);
        let b = Fingerprint::of_signal(&[1.0, 2.0, 0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_changes_key() {
        let fp = Fingerprint::of_signal(&[1.0, 2.0]);
        assert_ne!(fp, fp.salted(b"trials=50"));
        assert_eq!(fp.salted(b"trials=50"), fp.salted(b"trials=50"));
        assert_ne!(fp.salted(b"trials=50"), fp.salted(b"trials=1"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint::of_signal(&[4.2, 4.3]);
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Fingerprint::from_hex(&hex), Some(fp));
        assert_eq!(Fingerprint::from_hex("abc"), None);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let fp = Fingerprint::of_signal(&[1.5]);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    proptest! {
        #[test]
        fn prop_single_value_change_changes_fingerprint(
            values in prop::collection::vec(-1e3f64..1e3, 1..64),
            idx in 0usize..64,
            delta in 1e-6f64..1.0,
        ) {
            let idx = idx % values.len();
            let mut changed = values.clone();
            changed[idx] += delta;
            prop_assume!(changed[idx] != values[idx]);
            prop_assert_ne!(Fingerprint::of_signal(&values), Fingerprint::of_signal(&changed));
        }
    }
}
