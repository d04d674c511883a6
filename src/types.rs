use alloy_primitives::{Address, FixedBytes, B256};
use serde::{Deserialize, Serialize};

use crate::attestation::AttestationPayload;
use crate::error::{Result, VerifyError};

/// 65-byte recoverable signature in `r || s || v` form.
pub type SignatureBytes = FixedBytes<65>;

/// Result object exactly as the TransGate extension hands it over.
///
/// Every byte field is a `0x`-prefixed hex string. Nothing here is trusted
/// until it has been converted into a [`VerificationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransgateResponse {
    pub task_id: String,
    pub u_hash: String,
    pub public_fields_hash: String,
    pub allocator_address: String,
    pub allocator_signature: String,
    pub validator_address: String,
    pub validator_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default)]
    pub public_fields: Vec<serde_json::Value>,
}

/// A result whose fields all have the right shape. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub task_id: String,
    pub u_hash: B256,
    pub public_fields_hash: B256,
    /// Claimed allocator. Informational only; the recovered signer is what counts.
    pub allocator_address: Address,
    pub allocator_signature: SignatureBytes,
    pub validator_address: Address,
    pub validator_signature: SignatureBytes,
    pub recipient: Option<Address>,
    pub public_fields: Vec<serde_json::Value>,
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<FixedBytes<N>> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let bytes = hex::decode(digits).map_err(|e| {
        VerifyError::MalformedResult(format!("{} is not valid hex: {}", field, e))
    })?;
    if bytes.len() != N {
        return Err(VerifyError::MalformedResult(format!(
            "{} must be {} bytes, got {}",
            field,
            N,
            bytes.len()
        )));
    }
    Ok(FixedBytes::from_slice(&bytes))
}

/// Parse a 20-byte address. Case is irrelevant; checksums are not enforced.
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    decode_fixed::<20>(field, value).map(Address::from)
}

fn parse_signature(field: &str, value: &str) -> Result<SignatureBytes> {
    let sig = decode_fixed::<65>(field, value)?;
    match sig[64] {
        0 | 1 | 27 | 28 => Ok(sig),
        v => Err(VerifyError::MalformedResult(format!(
            "{} has invalid recovery id {}",
            field, v
        ))),
    }
}

/// Empty strings and `null` both mean "no recipient was bound".
pub fn parse_optional_address(field: &str, value: Option<&str>) -> Result<Option<Address>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_address(field, v).map(Some),
    }
}

fn to_hex<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl TryFrom<&TransgateResponse> for VerificationResult {
    type Error = VerifyError;

    fn try_from(raw: &TransgateResponse) -> Result<Self> {
        if raw.task_id.is_empty() {
            return Err(VerifyError::MalformedResult("taskId is empty".to_string()));
        }

        Ok(Self {
            task_id: raw.task_id.clone(),
            u_hash: decode_fixed("uHash", &raw.u_hash)?,
            public_fields_hash: decode_fixed("publicFieldsHash", &raw.public_fields_hash)?,
            allocator_address: parse_address("allocatorAddress", &raw.allocator_address)?,
            allocator_signature: parse_signature("allocatorSignature", &raw.allocator_signature)?,
            validator_address: parse_address("validatorAddress", &raw.validator_address)?,
            validator_signature: parse_signature("validatorSignature", &raw.validator_signature)?,
            recipient: parse_optional_address("recipient", raw.recipient.as_deref())?,
            public_fields: raw.public_fields.clone(),
        })
    }
}

impl VerificationResult {
    /// Render back into the extension's wire form.
    pub fn to_wire(&self) -> TransgateResponse {
        TransgateResponse {
            task_id: self.task_id.clone(),
            u_hash: to_hex(self.u_hash),
            public_fields_hash: to_hex(self.public_fields_hash),
            allocator_address: self.allocator_address.to_checksum(None),
            allocator_signature: to_hex(self.allocator_signature),
            validator_address: self.validator_address.to_checksum(None),
            validator_signature: to_hex(self.validator_signature),
            recipient: self.recipient.map(|r| r.to_checksum(None)),
            public_fields: self.public_fields.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub schema_id: Option<String>,
    pub result: TransgateResponse,
    /// Recipient the caller bound at launch time, if any.
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TransgateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub app_id: Option<String>,
    pub schema_id: Option<String>,
    pub allocator_address: String,
    pub validator_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub allocator_address: String,
    pub validator_address: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
