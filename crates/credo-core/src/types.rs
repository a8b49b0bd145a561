use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Identifier of a registered identity.
///
/// Ids are assigned by the identity registry, start at 1, and are strictly
/// increasing. Id 0 is never assigned.
pub type IdentityId = u64;

/// An address-like identifier for any acting party in the protocol:
/// identity owners, delegates, raters, validators, and responders.
///
/// For keypair-controlled principals the 32 bytes are the Ed25519 public
/// key, which lets signature checks reinterpret the principal as a verifying
/// key without a lookup. Other principals (contract-style signers) are
/// opaque 32-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal([u8; 32]);

impl Principal {
    /// The all-zero principal, used as a null sentinel.
    pub const ZERO: Principal = Principal([0u8; 32]);

    /// Create a principal from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the null sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Encode as base58.
    pub fn to_bs58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Decode from base58.
    pub fn from_bs58(s: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidPrincipal(format!("invalid base58: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::InvalidPrincipal(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bs58())
    }
}

/// BLAKE3 hash value (32 bytes).
///
/// Used for registry references, evidence integrity hashes, and validation
/// commitment hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The all-zero hash.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Create a hash from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the all-zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Encode as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes =
            hex::decode(s).map_err(|e| CoreError::InvalidHash(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::InvalidHash(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
