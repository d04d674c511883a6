//! The proof-generation side: a TransGate extension (or any bridge to it)
//! that produces a raw result for a schema.

use std::future::Future;

use alloy_primitives::Address;
use thiserror::Error;

use crate::error::VerifyError;
use crate::types::TransgateResponse;
use crate::verifier::{Outcome, ResultVerifier};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("extension unavailable")]
    Unavailable,

    #[error("cancelled by user")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// Source of TransGate results. Bound to one application id.
pub trait ProofChannel {
    fn app_id(&self) -> &str;

    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Run the verification flow for `schema_id`, optionally binding the
    /// result to `recipient`.
    fn launch(
        &self,
        schema_id: &str,
        recipient: Option<Address>,
    ) -> impl Future<Output = Result<TransgateResponse, ChannelError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub outcome: Outcome,
    pub message: String,
}

impl SessionOutcome {
    fn new(outcome: Outcome) -> Self {
        let message = outcome.message();
        Self { outcome, message }
    }
}

/// Launch one request on `channel` and verify whatever comes back.
/// Channel failures are reported as outcomes; nothing is retried.
pub async fn request_and_verify<C: ProofChannel>(
    channel: &C,
    schema_id: &str,
    recipient: Option<Address>,
    verifier: &ResultVerifier,
) -> SessionOutcome {
    if !channel.is_available().await {
        tracing::warn!("TransGate not available for app={}", channel.app_id());
        return SessionOutcome::new(Outcome::Error(VerifyError::ChannelUnavailable));
    }

    tracing::info!(
        "Launching TransGate app={} schema={} recipient={:?}",
        channel.app_id(),
        schema_id,
        recipient
    );

    let raw = match channel.launch(schema_id, recipient).await {
        Ok(raw) => raw,
        Err(ChannelError::Unavailable) => {
            return SessionOutcome::new(Outcome::Error(VerifyError::ChannelUnavailable))
        }
        Err(e) => {
            tracing::warn!("TransGate launch failed for schema={}: {}", schema_id, e);
            return SessionOutcome::new(Outcome::Error(VerifyError::Channel(e.to_string())));
        }
    };

    SessionOutcome::new(verifier.verify_response(schema_id, &raw, recipient))
}
