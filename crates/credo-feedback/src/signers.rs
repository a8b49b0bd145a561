//! Two-path signer verification.
//!
//! A feedback authorization attests to a `signer` principal. Verification
//! tries the direct cryptographic path first: the principal bytes are
//! reinterpreted as an Ed25519 public key and the signature is checked
//! against the payload. That path never aborts the operation; principals
//! that are not valid curve points simply don't match. Only when the direct
//! path produces no match does verification fall back to a contract-style
//! signer registered in the `SignerDirectory`, which exposes its own
//! verification entry point. Some signing clients cannot be verified
//! directly; those are commonly registered as contract-style signers.

use dashmap::DashMap;
use std::sync::Arc;

use credo_core::Principal;
use credo_crypto::{verify, PublicKey, Signature};

/// A signer that exposes its own signature verification entry point.
pub trait SignerVerifier: Send + Sync {
    /// Whether `signature` is a valid signature by this signer over
    /// `payload`.
    fn verify_signature(&self, payload: &[u8], signature: &[u8; 64]) -> bool;
}

/// Registry of contract-style signers, keyed by principal.
#[derive(Default)]
pub struct SignerDirectory {
    verifiers: DashMap<Principal, Arc<dyn SignerVerifier>>,
}

impl SignerDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            verifiers: DashMap::new(),
        }
    }

    /// Register a contract-style signer for a principal.
    pub fn register(&self, principal: Principal, verifier: Arc<dyn SignerVerifier>) {
        tracing::info!(principal = %principal, "contract-style signer registered");
        self.verifiers.insert(principal, verifier);
    }

    /// Remove a registered signer.
    pub fn unregister(&self, principal: &Principal) -> bool {
        self.verifiers.remove(principal).is_some()
    }

    /// Whether a contract-style signer is registered for the principal.
    pub fn contains(&self, principal: &Principal) -> bool {
        self.verifiers.contains_key(principal)
    }

    /// Run the registered signer's verification entry point, if any.
    pub fn verify(&self, principal: &Principal, payload: &[u8], signature: &[u8; 64]) -> bool {
        self.verifiers
            .get(principal)
            .map(|verifier| verifier.verify_signature(payload, signature))
            .unwrap_or(false)
    }

    /// Two-path check that `signature` over `payload` attests to `signer`.
    ///
    /// Direct Ed25519 first (non-throwing), contract-style fallback second.
    pub fn attests(&self, signer: &Principal, payload: &[u8], signature: &[u8; 64]) -> bool {
        if let Ok(pubkey) = PublicKey::from_bytes(signer.as_bytes()) {
            let sig = Signature::from_bytes(signature);
            if verify(payload, &sig, &pubkey).is_ok() {
                return true;
            }
        }
        self.verify(signer, payload, signature)
    }
}
