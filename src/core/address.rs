//! 32-byte identities for workers and depositors
//!
//! Addresses are displayed and parsed as base58, like account keys on the
//! Celereum chain.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Address of a worker (validator) or receipt-token holder
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

/// Worker (validator) identity
pub type WorkerId = Address;

/// Receipt-token holder identity
pub type AccountId = Address;

impl Address {
    /// Create from raw bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Zero address
    pub fn zero() -> Self {
        Address([0u8; 32])
    }

    /// Derive a deterministic address from a seed
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"CELEREUM_LST_ADDRESS_V1");
        hasher.update(seed);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Address(bytes)
    }

    /// Generate a random address
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Address(bytes)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to base58 string
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse from base58 string
    pub fn from_base58(s: &str) -> Result<Self, AddressParseError> {
        let bytes = bs58::decode(s).into_vec().map_err(AddressParseError::Base58)?;
        if bytes.len() != 32 {
            return Err(AddressParseError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

/// Address parsing error
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    #[error("Base58 error: {0}")]
    Base58(bs58::decode::Error),

    #[error("Invalid address length: {0} (expected 32)")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_base58();
        write!(f, "Address({}...)", &encoded[..encoded.len().min(8)])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_roundtrip() {
        let address = Address::from_seed(b"worker-1");
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_seeded_addresses_are_deterministic() {
        assert_eq!(Address::from_seed(b"a"), Address::from_seed(b"a"));
        assert_ne!(Address::from_seed(b"a"), Address::from_seed(b"b"));
        assert!(!Address::from_seed(b"a").is_zero());
    }

    #[test]
    fn test_invalid_length_rejected() {
        let short = bs58::encode([1u8; 8]).into_string();
        assert!(matches!(
            Address::from_base58(&short),
            Err(AddressParseError::InvalidLength(8))
        ));
    }
}
