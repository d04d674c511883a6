//! Relying-party verification of zkPass TransGate results.
//!
//! A result is accepted only when the allocator's signature over
//! `(taskId, schemaId, validatorAddress)` and the validator's signature over
//! `(taskId, schemaId, uHash, publicFieldsHash[, recipient])` both recover to
//! the configured trusted addresses.

pub mod attestation;
pub mod channel;
pub mod config;
pub mod encoding;
pub mod error;
pub mod routes;
pub mod types;
pub mod verifier;

pub use config::{ServiceConfig, TrustConfig};
pub use error::VerifyError;
pub use types::{TransgateResponse, VerificationResult};
pub use verifier::{check_allocator_signature, check_validator_signature, Outcome, ResultVerifier};
