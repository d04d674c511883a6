use thiserror::Error;

/// Everything that can stop a result from being accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Please install TransGate")]
    ChannelUnavailable,

    #[error("TransGate error: {0}")]
    Channel(String),

    #[error("Allocator signature is invalid")]
    AllocatorSignatureInvalid,

    #[error("Validator signature is invalid")]
    ValidatorSignatureInvalid,

    #[error("Malformed result: {0}")]
    MalformedResult(String),

    #[error("Encoding failed: {0}")]
    EncodingOrHashFailure(String),
}

impl VerifyError {
    /// Stable machine-checkable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            VerifyError::ChannelUnavailable => "channel_unavailable",
            VerifyError::Channel(_) => "channel_error",
            VerifyError::AllocatorSignatureInvalid => "allocator_signature_invalid",
            VerifyError::ValidatorSignatureInvalid => "validator_signature_invalid",
            VerifyError::MalformedResult(_) => "malformed_result",
            VerifyError::EncodingOrHashFailure(_) => "encoding_failure",
        }
    }

    /// True for a well-formed signature that recovered to an untrusted signer.
    pub fn is_signature_rejection(&self) -> bool {
        matches!(
            self,
            VerifyError::AllocatorSignatureInvalid | VerifyError::ValidatorSignatureInvalid
        )
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
