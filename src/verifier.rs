//! Two-signature check of a TransGate result.
//!
//! The allocator signs `(taskId, schemaId, validatorAddress)`; the validator
//! signs `(taskId, schemaId, uHash, publicFieldsHash[, recipient])`. A result
//! is accepted only when both recovered signers equal the configured trusted
//! addresses. No I/O, no shared mutable state.

use alloy_primitives::{Address, Signature, B256};

use crate::config::TrustConfig;
use crate::encoding::{AllocatorTuple, SignedTuple, ValidatorTuple};
use crate::error::{Result, VerifyError};
use crate::types::{parse_optional_address, SignatureBytes, TransgateResponse, VerificationResult};

/// Terminal result of one verification call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(VerificationResult),
    /// A signature recovered to an untrusted signer.
    Rejected(VerifyError),
    /// The result could not be checked at all.
    Error(VerifyError),
}

impl Outcome {
    fn from_error(err: VerifyError) -> Self {
        if err.is_signature_rejection() {
            Outcome::Rejected(err)
        } else {
            Outcome::Error(err)
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Accepted(_) => "accepted",
            Outcome::Rejected(err) => err.tag(),
            Outcome::Error(_) => "validation_failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Accepted(_) => "Verification successful".to_string(),
            Outcome::Rejected(err) | Outcome::Error(err) => err.to_string(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn error(&self) -> Option<&VerifyError> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(err) | Outcome::Error(err) => Some(err),
        }
    }
}

fn recover_signer(role: &str, signature: &SignatureBytes, digest: &B256) -> Result<Address> {
    let sig = Signature::try_from(signature.as_slice()).map_err(|e| {
        VerifyError::MalformedResult(format!("{} signature unreadable: {}", role, e))
    })?;
    sig.recover_address_from_prehash(digest).map_err(|e| {
        VerifyError::MalformedResult(format!("{} signature unrecoverable: {}", role, e))
    })
}

fn allocator_signer(schema_id: &str, result: &VerificationResult) -> Result<Address> {
    let digest = AllocatorTuple::new(schema_id, result)?.signed_digest()?;
    recover_signer("allocator", &result.allocator_signature, &digest)
}

fn validator_signer(schema_id: &str, result: &VerificationResult) -> Result<Address> {
    let digest = ValidatorTuple::new(schema_id, result)?.signed_digest()?;
    recover_signer("validator", &result.validator_signature, &digest)
}

/// True iff the allocator signature recovers to `trusted_allocator`.
/// Any failure along the way reads as "invalid".
pub fn check_allocator_signature(
    schema_id: &str,
    result: &VerificationResult,
    trusted_allocator: Address,
) -> bool {
    matches!(allocator_signer(schema_id, result), Ok(signer) if signer == trusted_allocator)
}

/// True iff the validator signature recovers to `trusted_validator`. The
/// recipient, when present, is part of the signed tuple.
pub fn check_validator_signature(
    schema_id: &str,
    result: &VerificationResult,
    trusted_validator: Address,
) -> bool {
    matches!(validator_signer(schema_id, result), Ok(signer) if signer == trusted_validator)
}

/// Verifies results against a fixed [`TrustConfig`]. Cheap to copy and safe
/// to share across tasks.
#[derive(Debug, Clone, Copy)]
pub struct ResultVerifier {
    trust: TrustConfig,
}

impl ResultVerifier {
    pub fn new(trust: TrustConfig) -> Self {
        Self { trust }
    }

    pub fn trust(&self) -> &TrustConfig {
        &self.trust
    }

    fn check(&self, schema_id: &str, result: &VerificationResult) -> Result<()> {
        let allocator = allocator_signer(schema_id, result)?;
        if allocator != self.trust.allocator {
            tracing::warn!(
                "Allocator signature rejected for task={} schema={}: recovered {} (claimed {})",
                result.task_id,
                schema_id,
                allocator,
                result.allocator_address
            );
            return Err(VerifyError::AllocatorSignatureInvalid);
        }

        let validator = validator_signer(schema_id, result)?;
        if validator != self.trust.validator {
            tracing::warn!(
                "Validator signature rejected for task={} schema={} recipient_bound={}: recovered {}",
                result.task_id,
                schema_id,
                result.recipient.is_some(),
                validator
            );
            return Err(VerifyError::ValidatorSignatureInvalid);
        }

        Ok(())
    }

    /// Allocator first, then validator. The first failure decides the outcome.
    pub fn verify(&self, schema_id: &str, result: &VerificationResult) -> Outcome {
        match self.check(schema_id, result) {
            Ok(()) => {
                tracing::info!(
                    "Verification accepted for task={} schema={}",
                    result.task_id,
                    schema_id
                );
                Outcome::Accepted(result.clone())
            }
            Err(err) => Outcome::from_error(err),
        }
    }

    /// Validate the raw extension result at the boundary, enforce the
    /// caller's expected recipient, then [`verify`](Self::verify).
    pub fn verify_response(
        &self,
        schema_id: &str,
        raw: &TransgateResponse,
        expected_recipient: Option<Address>,
    ) -> Outcome {
        let result = match VerificationResult::try_from(raw) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Rejecting malformed result for schema={}: {}", schema_id, err);
                return Outcome::Error(err);
            }
        };

        if let Some(expected) = expected_recipient {
            if result.recipient != Some(expected) {
                tracing::warn!(
                    "Recipient mismatch for task={}: expected {}, result has {:?}",
                    result.task_id,
                    expected,
                    result.recipient
                );
                return Outcome::Error(VerifyError::MalformedResult(
                    "recipient mismatch".to_string(),
                ));
            }
        }

        self.verify(schema_id, &result)
    }

    /// [`verify_response`](Self::verify_response) with the expected recipient
    /// still in text form.
    pub fn verify_response_str(
        &self,
        schema_id: &str,
        raw: &TransgateResponse,
        expected_recipient: Option<&str>,
    ) -> Outcome {
        match parse_optional_address("recipient", expected_recipient) {
            Ok(expected) => self.verify_response(schema_id, raw, expected),
            Err(err) => Outcome::Error(err),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::types::parse_address;

    const SCHEMA: &str = "schema-42";

    #[test]
    fn test_allocator_scenario_trusted_key() {
        let mut result = unsigned_result(None);
        result.validator_address = Address::repeat_byte(0xaa);
        sign_allocator(SCHEMA, &mut result, &allocator_key());

        let trusted = address_of(&allocator_key());
        assert!(check_allocator_signature(SCHEMA, &result, trusted));
    }

    #[test]
    fn test_allocator_scenario_other_key() {
        let mut result = unsigned_result(None);
        result.validator_address = Address::repeat_byte(0xaa);
        sign_allocator(SCHEMA, &mut result, &key(0x33));

        let trusted = address_of(&allocator_key());
        assert!(!check_allocator_signature(SCHEMA, &result, trusted));
    }

    #[test]
    fn test_allocator_signature_byte_flips_fail() {
        let result = signed_result(SCHEMA, None);
        let trusted = trust().allocator;
        for index in [0usize, 17, 31, 32, 50, 63, 64] {
            let mut tampered = result.clone();
            let mut bytes = tampered.allocator_signature.0;
            bytes[index] ^= 0x01;
            tampered.allocator_signature = SignatureBytes::from(bytes);
            assert!(
                !check_allocator_signature(SCHEMA, &tampered, trusted),
                "flip at byte {} still verified",
                index
            );
        }
    }

    #[test]
    fn test_allocator_tuple_field_changes_fail() {
        let result = signed_result(SCHEMA, None);
        let trusted = trust().allocator;

        let mut other_task = result.clone();
        other_task.task_id = "task-002".to_string();
        assert!(!check_allocator_signature(SCHEMA, &other_task, trusted));

        assert!(!check_allocator_signature("schema-43", &result, trusted));

        let mut other_validator = result.clone();
        other_validator.validator_address = Address::repeat_byte(0xaa);
        assert!(!check_allocator_signature(SCHEMA, &other_validator, trusted));
    }

    #[test]
    fn test_claimed_allocator_address_is_not_trusted() {
        let mut result = unsigned_result(None);
        sign_allocator(SCHEMA, &mut result, &key(0x44));
        result.allocator_address = trust().allocator;
        assert!(!check_allocator_signature(SCHEMA, &result, trust().allocator));
    }

    #[test]
    fn test_validator_scenario_without_recipient() {
        let result = signed_result(SCHEMA, None);
        let trusted = trust().validator;
        assert!(check_validator_signature(SCHEMA, &result, trusted));

        let mut with_recipient = result.clone();
        with_recipient.recipient = Some(Address::repeat_byte(0xcc));
        assert!(!check_validator_signature(SCHEMA, &with_recipient, trusted));
    }

    #[test]
    fn test_validator_with_recipient_fails_without_it() {
        let result = signed_result(SCHEMA, Some(Address::repeat_byte(0xcc)));
        let trusted = trust().validator;
        assert!(check_validator_signature(SCHEMA, &result, trusted));

        let mut stripped = result.clone();
        stripped.recipient = None;
        assert!(!check_validator_signature(SCHEMA, &stripped, trusted));

        let mut swapped = result.clone();
        swapped.recipient = Some(Address::repeat_byte(0xdd));
        assert!(!check_validator_signature(SCHEMA, &swapped, trusted));
    }

    #[test]
    fn test_validator_commitment_changes_fail() {
        let result = signed_result(SCHEMA, None);
        let trusted = trust().validator;

        let mut other_u_hash = result.clone();
        other_u_hash.u_hash = B256::repeat_byte(0x12);
        assert!(!check_validator_signature(SCHEMA, &other_u_hash, trusted));

        let mut other_fields = result.clone();
        other_fields.public_fields_hash = B256::repeat_byte(0x23);
        assert!(!check_validator_signature(SCHEMA, &other_fields, trusted));
    }

    #[test]
    fn test_address_comparison_is_case_insensitive() {
        let trusted = trust().allocator;
        let checksummed = trusted.to_checksum(None);
        let lowercase = checksummed.to_lowercase();
        assert_ne!(checksummed, lowercase);

        let from_checksummed = parse_address("allocator", &checksummed).unwrap();
        let from_lowercase = parse_address("allocator", &lowercase).unwrap();
        assert_eq!(from_checksummed, from_lowercase);

        let result = signed_result(SCHEMA, None);
        assert!(check_allocator_signature(SCHEMA, &result, from_checksummed));
        assert!(check_allocator_signature(SCHEMA, &result, from_lowercase));
    }

    #[test]
    fn test_unrecoverable_signature_is_false_not_panic() {
        let mut result = signed_result(SCHEMA, None);
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        result.allocator_signature = SignatureBytes::from(bytes);
        assert!(!check_allocator_signature(SCHEMA, &result, trust().allocator));
    }

    #[test]
    fn test_verify_accepts_fully_signed_result() {
        let verifier = ResultVerifier::new(trust());
        let result = signed_result(SCHEMA, None);
        let outcome = verifier.verify(SCHEMA, &result);
        assert_eq!(outcome, Outcome::Accepted(result));
        assert_eq!(outcome.tag(), "accepted");
        assert_eq!(outcome.message(), "Verification successful");
    }

    #[test]
    fn test_verify_accepts_recipient_bound_result() {
        let verifier = ResultVerifier::new(trust());
        let result = signed_result(SCHEMA, Some(Address::repeat_byte(0xcc)));
        assert!(verifier.verify(SCHEMA, &result).is_accepted());
    }

    #[test]
    fn test_verify_rejects_untrusted_allocator_first() {
        let verifier = ResultVerifier::new(trust());
        let mut result = unsigned_result(None);
        sign_allocator(SCHEMA, &mut result, &key(0x33));
        sign_validator(SCHEMA, &mut result, &key(0x34));

        let outcome = verifier.verify(SCHEMA, &result);
        assert_eq!(outcome, Outcome::Rejected(VerifyError::AllocatorSignatureInvalid));
        assert_eq!(outcome.tag(), "allocator_signature_invalid");
        assert_eq!(outcome.message(), "Allocator signature is invalid");
    }

    #[test]
    fn test_verify_rejects_untrusted_validator() {
        let verifier = ResultVerifier::new(trust());
        let mut result = unsigned_result(None);
        sign_allocator(SCHEMA, &mut result, &allocator_key());
        sign_validator(SCHEMA, &mut result, &key(0x34));

        let outcome = verifier.verify(SCHEMA, &result);
        assert_eq!(outcome, Outcome::Rejected(VerifyError::ValidatorSignatureInvalid));
        assert_eq!(outcome.tag(), "validator_signature_invalid");
    }

    #[test]
    fn test_verify_unrecoverable_signature_is_error() {
        let verifier = ResultVerifier::new(trust());
        let mut result = signed_result(SCHEMA, None);
        let mut bytes = [0u8; 65];
        bytes[64] = 28;
        result.validator_signature = SignatureBytes::from(bytes);

        let outcome = verifier.verify(SCHEMA, &result);
        assert!(matches!(outcome, Outcome::Error(VerifyError::MalformedResult(_))));
        assert_eq!(outcome.tag(), "validation_failed");
    }

    #[test]
    fn test_suffix_on_full_width_task_id_is_not_accepted() {
        let verifier = ResultVerifier::new(trust());
        let mut result = unsigned_result(None);
        result.task_id = "2f8b0c51d7a44c1f9e3b6a0d2c4e8f10".to_string();
        sign_allocator(SCHEMA, &mut result, &allocator_key());
        sign_validator(SCHEMA, &mut result, &validator_key());
        assert!(verifier.verify(SCHEMA, &result).is_accepted());

        let mut extended = result.clone();
        extended.task_id.push_str("-extra");
        assert!(!check_allocator_signature(SCHEMA, &extended, trust().allocator));
        assert!(!check_validator_signature(SCHEMA, &extended, trust().validator));

        let outcome = verifier.verify(SCHEMA, &extended);
        assert!(matches!(outcome, Outcome::Error(VerifyError::MalformedResult(_))));
        assert_eq!(outcome.tag(), "validation_failed");
    }

    #[test]
    fn test_over_long_schema_id_is_not_accepted() {
        let verifier = ResultVerifier::new(trust());
        let full_width = "s".repeat(32);
        let result = signed_result(&full_width, None);
        assert!(verifier.verify(&full_width, &result).is_accepted());

        let longer = "s".repeat(33);
        assert!(!check_allocator_signature(&longer, &result, trust().allocator));
        assert!(!check_validator_signature(&longer, &result, trust().validator));
        assert_eq!(verifier.verify(&longer, &result).tag(), "validation_failed");
    }

    #[test]
    fn test_verify_is_idempotent() {
        let verifier = ResultVerifier::new(trust());
        let good = signed_result(SCHEMA, None);
        assert_eq!(verifier.verify(SCHEMA, &good), verifier.verify(SCHEMA, &good));

        let bad = signed_result("schema-other", None);
        let first = verifier.verify(SCHEMA, &bad);
        let second = verifier.verify(SCHEMA, &bad);
        assert_eq!(first, second);
        assert!(!first.is_accepted());
    }

    #[test]
    fn test_verify_response_malformed_signature_length() {
        let verifier = ResultVerifier::new(trust());
        let mut raw = signed_result(SCHEMA, None).to_wire();
        raw.validator_signature.truncate(raw.validator_signature.len() - 2);

        let outcome = verifier.verify_response(SCHEMA, &raw, None);
        assert!(matches!(outcome, Outcome::Error(VerifyError::MalformedResult(_))));
    }

    #[test]
    fn test_verify_response_accepts_wire_form() {
        let verifier = ResultVerifier::new(trust());
        let raw = signed_result(SCHEMA, None).to_wire();
        assert!(verifier.verify_response(SCHEMA, &raw, None).is_accepted());
    }

    #[test]
    fn test_verify_response_enforces_expected_recipient() {
        let verifier = ResultVerifier::new(trust());
        let recipient = Address::repeat_byte(0xcc);

        let unbound = signed_result(SCHEMA, None).to_wire();
        let outcome = verifier.verify_response(SCHEMA, &unbound, Some(recipient));
        assert_eq!(
            outcome,
            Outcome::Error(VerifyError::MalformedResult("recipient mismatch".to_string()))
        );

        let bound = signed_result(SCHEMA, Some(recipient)).to_wire();
        assert!(verifier
            .verify_response(SCHEMA, &bound, Some(recipient))
            .is_accepted());

        let lowercase = format!("0x{}", "cc".repeat(20));
        assert!(verifier
            .verify_response_str(SCHEMA, &bound, Some(&lowercase))
            .is_accepted());
    }

    #[test]
    fn test_verify_response_str_rejects_bad_expected_recipient() {
        let verifier = ResultVerifier::new(trust());
        let raw = signed_result(SCHEMA, None).to_wire();
        let outcome = verifier.verify_response_str(SCHEMA, &raw, Some("0x1234"));
        assert!(matches!(outcome, Outcome::Error(VerifyError::MalformedResult(_))));
    }

    #[test]
    fn test_verifier_is_shareable_across_threads() {
        let verifier = ResultVerifier::new(trust());
        let result = signed_result(SCHEMA, None);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let result = result.clone();
                std::thread::spawn(move || verifier.verify(SCHEMA, &result).is_accepted())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
