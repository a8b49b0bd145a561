use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use credo_core::{Hash, IdentityId, Principal};
use credo_crypto::{sign, KeyPair, TaggedEncoder};

use crate::error::FeedbackError;

/// Wire length of the unsigned authorization tuple.
pub const AUTHORIZATION_TUPLE_LEN: usize = 128;
/// Wire length of a signed authorization blob: tuple plus Ed25519 signature.
pub const SIGNED_AUTHORIZATION_LEN: usize = AUTHORIZATION_TUPLE_LEN + 64;

/// Unsigned feedback authorization tuple.
///
/// Constructed off-ledger by an identity's controlling principal (or
/// delegate) and signed; grants exactly one rater permission to submit
/// feedback entries up to `index_limit`, until `expiry`. The tuple binds
/// the grant to one identity, one protocol domain, and one registry
/// deployment, so a signature can never be replayed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAuthorization {
    /// Identity the feedback targets.
    pub identity_id: IdentityId,
    /// The one rater this authorization empowers.
    pub rater: Principal,
    /// Highest sequence index the rater may reach under this grant.
    pub index_limit: u64,
    /// Expiry instant; submissions at or after it are rejected.
    pub expiry: DateTime<Utc>,
    /// Protocol domain the grant is bound to.
    pub domain: u64,
    /// Reference hash of the identity registry the ledger consults.
    pub registry_ref: Hash,
    /// Principal whose signature accompanies the tuple.
    pub signer: Principal,
}

impl FeedbackAuthorization {
    /// Fixed-width wire encoding of the tuple (128 bytes).
    pub fn to_wire_bytes(&self) -> [u8; AUTHORIZATION_TUPLE_LEN] {
        let mut buf = [0u8; AUTHORIZATION_TUPLE_LEN];
        buf[0..8].copy_from_slice(&self.identity_id.to_be_bytes());
        buf[8..40].copy_from_slice(self.rater.as_bytes());
        buf[40..48].copy_from_slice(&self.index_limit.to_be_bytes());
        buf[48..56].copy_from_slice(&self.expiry.timestamp().to_be_bytes());
        buf[56..64].copy_from_slice(&self.domain.to_be_bytes());
        buf[64..96].copy_from_slice(self.registry_ref.as_bytes());
        buf[96..128].copy_from_slice(self.signer.as_bytes());
        buf
    }

    /// Type-tagged signing payload.
    ///
    /// This, not the wire bytes, is what gets signed: every field carries a
    /// type tag so the encoding is injective across tuples.
    pub fn signing_payload(&self) -> Vec<u8> {
        TaggedEncoder::new()
            .push_u64(self.identity_id)
            .push_bytes(self.rater.as_bytes())
            .push_u64(self.index_limit)
            .push_i64(self.expiry.timestamp())
            .push_u64(self.domain)
            .push_bytes(self.registry_ref.as_bytes())
            .push_bytes(self.signer.as_bytes())
            .finish()
    }

    /// Sign the tuple and produce the 192-byte submission blob.
    ///
    /// The caller is responsible for `signer` matching the keypair's
    /// principal; the ledger independently verifies both the signature and
    /// the signer's authority over the identity.
    pub fn sign(&self, keypair: &KeyPair) -> Vec<u8> {
        let signature = sign(&self.signing_payload(), keypair);
        let mut blob = Vec::with_capacity(SIGNED_AUTHORIZATION_LEN);
        blob.extend_from_slice(&self.to_wire_bytes());
        blob.extend_from_slice(&signature.to_bytes());
        blob
    }

    /// Parse a signed blob into the tuple and its detached signature.
    ///
    /// The length is checked before any field is interpreted; anything
    /// other than exactly 192 bytes is malformed.
    pub fn decode(blob: &[u8]) -> Result<(Self, [u8; 64]), FeedbackError> {
        if blob.len() != SIGNED_AUTHORIZATION_LEN {
            return Err(FeedbackError::MalformedAuthorization {
                expected: SIGNED_AUTHORIZATION_LEN,
                actual: blob.len(),
            });
        }

        let mut word = [0u8; 8];
        word.copy_from_slice(&blob[0..8]);
        let identity_id = u64::from_be_bytes(word);
        let mut rater = [0u8; 32];
        rater.copy_from_slice(&blob[8..40]);
        word.copy_from_slice(&blob[40..48]);
        let index_limit = u64::from_be_bytes(word);
        word.copy_from_slice(&blob[48..56]);
        let expiry_secs = i64::from_be_bytes(word);
        word.copy_from_slice(&blob[56..64]);
        let domain = u64::from_be_bytes(word);
        let mut registry_ref = [0u8; 32];
        registry_ref.copy_from_slice(&blob[64..96]);
        let mut signer = [0u8; 32];
        signer.copy_from_slice(&blob[96..128]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&blob[128..192]);

        let expiry = match Utc.timestamp_opt(expiry_secs, 0).single() {
            Some(ts) => ts,
            None => {
                return Err(FeedbackError::MalformedAuthorization {
                    expected: SIGNED_AUTHORIZATION_LEN,
                    actual: blob.len(),
                })
            }
        };

        Ok((
            Self {
                identity_id,
                rater: Principal::from_bytes(rater),
                index_limit,
                expiry,
                domain,
                registry_ref: Hash::from_bytes(registry_ref),
                signer: Principal::from_bytes(signer),
            },
            signature,
        ))
    }
}
