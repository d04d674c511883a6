use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::attestation::AttestationPayload;
use crate::config::ServiceConfig;
use crate::types::{ConfigResponse, ErrorResponse, HealthResponse, VerifyRequest, VerifyResponse};
use crate::verifier::{Outcome, ResultVerifier};

/// Shared application state passed to all route handlers. Read-only.
pub struct AppState {
    pub verifier: ResultVerifier,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            verifier: ResultVerifier::new(config.trust),
            config,
        }
    }
}

fn verify_response(schema_id: &str, outcome: Outcome) -> VerifyResponse {
    let attestation = AttestationPayload::from_outcome(schema_id, &outcome);
    let (error_kind, detail) = match &outcome {
        Outcome::Error(err) => (Some(err.tag().to_string()), Some(err.to_string())),
        _ => (None, None),
    };
    let result = match &outcome {
        Outcome::Accepted(result) => Some(result.to_wire()),
        _ => None,
    };

    VerifyResponse {
        status: outcome.tag().to_string(),
        message: outcome.message(),
        error_kind,
        detail,
        result,
        attestation,
    }
}

/// POST /verify — Check both signatures on a TransGate result.
///
/// Request body: VerifyRequest { schemaId?, result, recipient? }
/// Response: VerifyResponse; every verification outcome is a 200.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let schema_id = match req
        .schema_id
        .filter(|s| !s.is_empty())
        .or_else(|| state.config.schema_id.clone())
    {
        Some(schema_id) => schema_id,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "schemaId is required".to_string(),
                }),
            )
                .into_response();
        }
    };

    let outcome =
        state
            .verifier
            .verify_response_str(&schema_id, &req.result, req.recipient.as_deref());

    tracing::info!(
        "Verification for task={} schema={}: {}",
        req.result.task_id,
        schema_id,
        outcome.tag()
    );

    (StatusCode::OK, Json(verify_response(&schema_id, outcome))).into_response()
}

/// GET /config — What a client needs to launch TransGate against this service.
pub async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let trust = state.verifier.trust();
    (
        StatusCode::OK,
        Json(ConfigResponse {
            app_id: state.config.app_id.clone(),
            schema_id: state.config.schema_id.clone(),
            allocator_address: trust.allocator.to_checksum(None),
            validator_address: trust.validator.to_checksum(None),
        }),
    )
}

/// GET /health — Health check endpoint.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let trust = state.verifier.trust();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            allocator_address: trust.allocator.to_checksum(None),
            validator_address: trust.validator.to_checksum(None),
        }),
    )
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/verify", post(verify_handler))
        .route("/config", get(config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
