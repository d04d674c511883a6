use alloy_primitives::Address;
use serde::Serialize;

use crate::encoding::fixed_word;
use crate::types::VerificationResult;
use crate::verifier::Outcome;

/// Accepted result re-encoded for an on-chain attestation call.
///
/// Field order and widths follow the verifier contract's proof struct:
/// text ids become `bytes32`, an unbound recipient is the zero address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationPayload {
    pub task_id: String,
    pub schema_id: String,
    pub u_hash: String,
    pub recipient: String,
    pub public_fields_hash: String,
    pub validator: String,
    pub allocator_signature: String,
    pub validator_signature: String,
}

fn hex_prefixed<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl AttestationPayload {
    fn new(schema_id: &str, result: &VerificationResult) -> Option<Self> {
        Some(Self {
            task_id: hex_prefixed(fixed_word(&result.task_id).ok()?),
            schema_id: hex_prefixed(fixed_word(schema_id).ok()?),
            u_hash: hex_prefixed(result.u_hash),
            recipient: result.recipient.unwrap_or(Address::ZERO).to_checksum(None),
            public_fields_hash: hex_prefixed(result.public_fields_hash),
            validator: result.validator_address.to_checksum(None),
            allocator_signature: hex_prefixed(result.allocator_signature),
            validator_signature: hex_prefixed(result.validator_signature),
        })
    }

    /// `None` unless the outcome is an acceptance.
    pub fn from_outcome(schema_id: &str, outcome: &Outcome) -> Option<Self> {
        match outcome {
            Outcome::Accepted(result) => Self::new(schema_id, result),
            _ => None,
        }
    }
}
