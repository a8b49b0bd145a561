//! Credo cryptographic operations.
//!
//! Ed25519 keypairs and signatures for principals, BLAKE3 hashing for
//! registry references and commitment hashes, and the deterministic
//! type-tagged payload encoder that signature checks and commitment
//! derivation are computed over.

pub mod encoding;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use encoding::TaggedEncoder;
pub use error::CryptoError;
pub use hashing::hash;
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, verify, Signature};
