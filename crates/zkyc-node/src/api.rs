//! HTTP API server for the zkyc node.
//!
//! Provides REST endpoints for the credential registry, verification
//! requests, proof submission, and the development payment rail.
//!
//! Issuance, revocation and request creation arrive as [`SignedEnvelope`]s.
//! The acting account is the signer of the envelope, never a body field.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use zkyc_core::{
    AccountId, Amount, Capabilities, CredentialCommitments, CredentialRecord, ErrorKind,
    FieldElement, Groth16Proof, PredicateParams, ProtocolError, RequestId, VerificationOutcome,
    VerificationRequest,
};
use zkyc_crypto::{actions, SignedEnvelope};

use crate::state::NodeState;

// --- Request / response types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub protocol_version: String,
    pub issuer: AccountId,
    pub backend: String,
    pub hasher: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Signed body of `POST /credentials/issue`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueCredentialRequest {
    pub subject: AccountId,
    pub label: String,
    pub commitments: CredentialCommitments,
}

/// Signed body of `POST /credentials/revoke`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeCredentialRequest {
    pub subject: AccountId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidityResponse {
    pub subject: AccountId,
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevokedResponse {
    pub secret_hash: FieldElement,
    pub revoked: bool,
}

/// Signed body of `POST /requests`. The signer pays the fee.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequestBody {
    pub subject: AccountId,
    pub params: PredicateParams,
    pub fee: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub request_id: RequestId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub subject: AccountId,
    pub request_ids: Vec<RequestId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    pub proof: Groth16Proof,
    pub public_signals: Vec<FieldElement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NullifierResponse {
    pub nullifier: FieldElement,
    pub used: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: AccountId,
    pub balance: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// HTTP status for each protocol error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyCompleted | ErrorKind::NullifierReused => StatusCode::CONFLICT,
        ErrorKind::InsufficientFee | ErrorKind::PaymentFailed => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::NoValidCredential
        | ErrorKind::CredentialRevoked
        | ErrorKind::CommitmentMismatch
        | ErrorKind::InvalidProof => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::ProverError | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::VerifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn reject(e: ProtocolError) -> ApiError {
    let kind = e.kind();
    (
        status_for(kind),
        Json(ErrorResponse {
            error: e.to_string(),
            kind,
            retryable: e.is_retryable(),
        }),
    )
}

fn parse_account(raw: &str) -> Result<AccountId, ApiError> {
    AccountId::parse(raw).map_err(reject)
}

fn parse_field(raw: &str) -> Result<FieldElement, ApiError> {
    FieldElement::parse_decimal(raw).map_err(|e| reject(e.into()))
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    let caps = state.ledger.capabilities();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        protocol_version: caps.protocol_version,
        issuer: caps.issuer,
        backend: state.backend.clone(),
        hasher: state.hasher.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn handle_capabilities(State(state): State<Arc<NodeState>>) -> Json<Capabilities> {
    Json(state.ledger.capabilities())
}

async fn handle_issue_credential(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope>,
) -> ApiResult<CredentialRecord> {
    let (caller, req): (AccountId, IssueCredentialRequest) = state
        .auth
        .authenticate(&envelope, actions::ISSUE)
        .map_err(reject)?;
    let record = state
        .ledger
        .issue(&caller, req.subject, &req.label, req.commitments)
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn handle_revoke_credential(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope>,
) -> ApiResult<ValidityResponse> {
    let (caller, req): (AccountId, RevokeCredentialRequest) = state
        .auth
        .authenticate(&envelope, actions::REVOKE)
        .map_err(reject)?;
    state
        .ledger
        .revoke(&caller, &req.subject)
        .await
        .map_err(reject)?;
    Ok(Json(ValidityResponse {
        subject: req.subject,
        valid: false,
    }))
}

async fn handle_get_credential(
    State(state): State<Arc<NodeState>>,
    Path(subject): Path<String>,
) -> ApiResult<CredentialRecord> {
    let subject = parse_account(&subject)?;
    Ok(Json(state.ledger.get_record(&subject).await.map_err(reject)?))
}

async fn handle_credential_validity(
    State(state): State<Arc<NodeState>>,
    Path(subject): Path<String>,
) -> ApiResult<ValidityResponse> {
    let subject = parse_account(&subject)?;
    Ok(Json(ValidityResponse {
        subject,
        valid: state.ledger.has_valid_credential(&subject).await,
    }))
}

async fn handle_revocation_status(
    State(state): State<Arc<NodeState>>,
    Path(secret_hash): Path<String>,
) -> ApiResult<RevokedResponse> {
    let secret_hash = parse_field(&secret_hash)?;
    Ok(Json(RevokedResponse {
        secret_hash,
        revoked: state.ledger.is_secret_hash_revoked(&secret_hash).await,
    }))
}

async fn handle_create_request(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope>,
) -> ApiResult<CreatedResponse> {
    let (requester, req): (AccountId, CreateRequestBody) = state
        .auth
        .authenticate(&envelope, actions::REQUEST)
        .map_err(reject)?;
    let request_id = state
        .ledger
        .request_verification(requester, req.subject, req.params, req.fee)
        .await
        .map_err(reject)?;
    Ok(Json(CreatedResponse { request_id }))
}

async fn handle_get_request(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
) -> ApiResult<VerificationRequest> {
    Ok(Json(
        state.ledger.get_request(RequestId(id)).await.map_err(reject)?,
    ))
}

async fn handle_get_result(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
) -> ApiResult<VerificationOutcome> {
    Ok(Json(
        state.ledger.get_result(RequestId(id)).await.map_err(reject)?,
    ))
}

async fn handle_submit_proof(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<u64>,
    Json(req): Json<SubmitProofRequest>,
) -> ApiResult<VerificationOutcome> {
    let outcome = state
        .ledger
        .complete_verification(RequestId(id), &req.proof, &req.public_signals)
        .await
        .map_err(reject)?;
    Ok(Json(outcome))
}

async fn handle_pending(
    State(state): State<Arc<NodeState>>,
    Path(subject): Path<String>,
) -> ApiResult<PendingResponse> {
    let subject = parse_account(&subject)?;
    Ok(Json(PendingResponse {
        subject,
        request_ids: state.ledger.get_pending_requests(&subject).await,
    }))
}

async fn handle_nullifier(
    State(state): State<Arc<NodeState>>,
    Path(nullifier): Path<String>,
) -> ApiResult<NullifierResponse> {
    let nullifier = parse_field(&nullifier)?;
    Ok(Json(NullifierResponse {
        nullifier,
        used: state.ledger.is_nullifier_used(&nullifier).await,
    }))
}

async fn handle_deposit(
    State(state): State<Arc<NodeState>>,
    Path(account): Path<String>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<BalanceResponse> {
    let account = parse_account(&account)?;
    let balance = state
        .ledger
        .deposit(&account, req.amount)
        .await
        .map_err(reject)?;
    Ok(Json(BalanceResponse { account, balance }))
}

async fn handle_balance(
    State(state): State<Arc<NodeState>>,
    Path(account): Path<String>,
) -> ApiResult<BalanceResponse> {
    let account = parse_account(&account)?;
    let balance = state.ledger.balance(&account).await.map_err(reject)?;
    Ok(Json(BalanceResponse { account, balance }))
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/capabilities", get(handle_capabilities))
        .route("/api/v1/credentials/issue", post(handle_issue_credential))
        .route("/api/v1/credentials/revoke", post(handle_revoke_credential))
        .route("/api/v1/credentials/{subject}", get(handle_get_credential))
        .route("/api/v1/credentials/{subject}/valid", get(handle_credential_validity))
        .route("/api/v1/revocations/{secret_hash}", get(handle_revocation_status))
        .route("/api/v1/requests", post(handle_create_request))
        .route("/api/v1/requests/{id}", get(handle_get_request))
        .route("/api/v1/requests/{id}/result", get(handle_get_result))
        .route("/api/v1/requests/{id}/proof", post(handle_submit_proof))
        .route("/api/v1/subjects/{subject}/pending", get(handle_pending))
        .route("/api/v1/nullifiers/{nullifier}", get(handle_nullifier))
        .route("/api/v1/accounts/{account}/deposit", post(handle_deposit))
        .route("/api/v1/accounts/{account}/balance", get(handle_balance))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
