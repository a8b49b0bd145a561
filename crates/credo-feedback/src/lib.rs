//! Credo Feedback Ledger
//!
//! Accepts cryptographically authorized feedback against registered
//! identities, stores it compactly under ledger-assigned sequence indices,
//! supports one-way revocation and third-party response annotations, and
//! computes caller-filtered aggregates.
//!
//! Authorization is a 192-byte blob: a fixed-width tuple signed by the
//! identity's controller (or a delegate) that grants exactly one rater a
//! bounded, expiring window of feedback submissions. Signature checks run a
//! two-path strategy: direct Ed25519 verification against the signer
//! principal first, then a contract-style fallback through the
//! `SignerDirectory`.

pub mod authorization;
pub mod error;
pub mod ledger;
pub mod signers;

pub use authorization::{FeedbackAuthorization, SIGNED_AUTHORIZATION_LEN};
pub use error::FeedbackError;
pub use ledger::{FeedbackEntry, FeedbackLedger, FeedbackRecord, FeedbackSummary};
pub use signers::{SignerDirectory, SignerVerifier};
