//! ABI parameter encoding of the tuples the allocator and validator sign.
//!
//! Both parties sign `eip191(keccak256(abi_encode_params(tuple)))`. Any
//! deviation in word layout silently changes the recovered address, so each
//! tuple shape is its own type.

use alloy_primitives::{eip191_hash_message, keccak256, Address, B256};
use alloy_sol_types::SolValue;

use crate::error::{Result, VerifyError};
use crate::types::VerificationResult;

pub const WORD_SIZE: usize = 32;

/// Text to `bytes32` the way the signers do it: UTF-8 bytes with NUL padding
/// stripped from both ends, right-padded with zeros. Text that does not fit
/// in one word cannot have been signed and is rejected.
pub fn fixed_word(text: &str) -> Result<B256> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| *b != 0).map_or(start, |i| i + 1);
    let trimmed = &bytes[start..end];

    if trimmed.len() > WORD_SIZE {
        return Err(VerifyError::MalformedResult(format!(
            "text of {} bytes does not fit in bytes32: {:?}",
            trimmed.len(),
            text
        )));
    }

    let mut word = B256::ZERO;
    word.0[..trimmed.len()].copy_from_slice(trimmed);
    Ok(word)
}

/// A fixed-shape tuple whose encoding is hashed and signed.
pub trait SignedTuple {
    /// Number of 32-byte words in the encoding.
    const WORDS: usize;

    fn encode(&self) -> Vec<u8>;

    /// keccak256 over the encoded tuple.
    fn params_hash(&self) -> Result<B256> {
        let encoded = self.encode();
        if encoded.len() != Self::WORDS * WORD_SIZE {
            return Err(VerifyError::EncodingOrHashFailure(format!(
                "expected {} encoded bytes, got {}",
                Self::WORDS * WORD_SIZE,
                encoded.len()
            )));
        }
        Ok(keccak256(&encoded))
    }

    /// The digest the signature actually covers: the personal-message hash
    /// of the 32-byte params hash.
    fn signed_digest(&self) -> Result<B256> {
        let params_hash = self.params_hash()?;
        let digest = eip191_hash_message(params_hash);
        tracing::debug!("params_hash={} digest={}", params_hash, digest);
        Ok(digest)
    }
}

/// `(bytes32 taskId, bytes32 schemaId, address validator)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorTuple {
    pub task_id: B256,
    pub schema_id: B256,
    pub validator: Address,
}

impl AllocatorTuple {
    pub fn new(schema_id: &str, result: &VerificationResult) -> Result<Self> {
        Ok(Self {
            task_id: fixed_word(&result.task_id)?,
            schema_id: fixed_word(schema_id)?,
            validator: result.validator_address,
        })
    }
}

impl SignedTuple for AllocatorTuple {
    const WORDS: usize = 3;

    fn encode(&self) -> Vec<u8> {
        (self.task_id, self.schema_id, self.validator).abi_encode_params()
    }
}

/// `(bytes32 taskId, bytes32 schemaId, bytes32 uHash, bytes32 publicFieldsHash)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorTuple4 {
    pub task_id: B256,
    pub schema_id: B256,
    pub u_hash: B256,
    pub public_fields_hash: B256,
}

impl SignedTuple for ValidatorTuple4 {
    const WORDS: usize = 4;

    fn encode(&self) -> Vec<u8> {
        (
            self.task_id,
            self.schema_id,
            self.u_hash,
            self.public_fields_hash,
        )
            .abi_encode_params()
    }
}

/// [`ValidatorTuple4`] with the bound recipient appended as an `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorTuple5 {
    pub task_id: B256,
    pub schema_id: B256,
    pub u_hash: B256,
    pub public_fields_hash: B256,
    pub recipient: Address,
}

impl SignedTuple for ValidatorTuple5 {
    const WORDS: usize = 5;

    fn encode(&self) -> Vec<u8> {
        (
            self.task_id,
            self.schema_id,
            self.u_hash,
            self.public_fields_hash,
            self.recipient,
        )
            .abi_encode_params()
    }
}

/// The validator's message. Which variant applies is decided once, from the
/// presence of a recipient, before anything is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorTuple {
    Unbound(ValidatorTuple4),
    Bound(ValidatorTuple5),
}

impl ValidatorTuple {
    pub fn new(schema_id: &str, result: &VerificationResult) -> Result<Self> {
        let task_id = fixed_word(&result.task_id)?;
        let schema_id = fixed_word(schema_id)?;
        let tuple = match result.recipient {
            Some(recipient) => ValidatorTuple::Bound(ValidatorTuple5 {
                task_id,
                schema_id,
                u_hash: result.u_hash,
                public_fields_hash: result.public_fields_hash,
                recipient,
            }),
            None => ValidatorTuple::Unbound(ValidatorTuple4 {
                task_id,
                schema_id,
                u_hash: result.u_hash,
                public_fields_hash: result.public_fields_hash,
            }),
        };
        Ok(tuple)
    }

    pub fn signed_digest(&self) -> Result<B256> {
        match self {
            ValidatorTuple::Unbound(t) => t.signed_digest(),
            ValidatorTuple::Bound(t) => t.signed_digest(),
        }
    }
}
