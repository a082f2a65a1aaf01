//! QR login routes: the browser generates and polls, the mobile app scans and
//! decides.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use scanpass_core::{
    IdentityToken, QrSessionId, QrSessionStatus, QrSessionStore, UserProfile, UserStore,
};
use serde::{Deserialize, Serialize};

use crate::{error::AuthApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrRequest {
    #[serde(default, alias = "device_info")]
    pub device_info: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrResponse {
    pub session_id: QrSessionId,
    pub qr_code_image: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of scan, confirm and reject.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrDecisionRequest {
    #[serde(alias = "session_id")]
    pub session_id: String,
    #[serde(alias = "app_token")]
    pub app_token: String,
}

#[derive(Debug, Deserialize)]
pub struct QrStatusQuery {
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrStatusResponse {
    pub session_id: QrSessionId,
    pub status: QrSessionStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<IdentityToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// An id that does not parse names no session, so it fails like an unknown one.
fn parse_session_id(raw: String, unknown: AuthApiError) -> Result<QrSessionId, AuthApiError> {
    QrSessionId::parse(raw).map_err(|_| unknown)
}

/// The body is optional; a request without a JSON content type starts a
/// session without device info.
#[tracing::instrument(name = "Generate QR", skip_all)]
pub async fn generate_qr<U, S>(
    State(state): State<AppState<U, S>>,
    body: Result<Json<GenerateQrRequest>, JsonRejection>,
) -> Result<Json<GenerateQrResponse>, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => GenerateQrRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let generated = state.orchestrator.generate_qr(request.device_info).await?;

    Ok(Json(GenerateQrResponse {
        session_id: generated.session_id,
        qr_code_image: generated.qr_code_image,
        expires_at: generated.expires_at,
    }))
}

#[tracing::instrument(name = "Scan QR", skip_all)]
pub async fn scan_qr<U, S>(
    State(state): State<AppState<U, S>>,
    body: Result<Json<QrDecisionRequest>, JsonRejection>,
) -> Result<StatusCode, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Json(request) = body?;
    let session_id = parse_session_id(request.session_id, AuthApiError::InvalidOrExpiredSession)?;

    state
        .orchestrator
        .scan_qr(&session_id, &request.app_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "Confirm QR", skip_all)]
pub async fn confirm_qr<U, S>(
    State(state): State<AppState<U, S>>,
    body: Result<Json<QrDecisionRequest>, JsonRejection>,
) -> Result<StatusCode, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Json(request) = body?;
    let session_id = parse_session_id(request.session_id, AuthApiError::InvalidOrExpiredSession)?;

    state
        .orchestrator
        .confirm_qr(&session_id, &request.app_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "Reject QR", skip_all)]
pub async fn reject_qr<U, S>(
    State(state): State<AppState<U, S>>,
    body: Result<Json<QrDecisionRequest>, JsonRejection>,
) -> Result<StatusCode, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Json(request) = body?;
    let session_id = parse_session_id(request.session_id, AuthApiError::InvalidOrExpiredSession)?;

    state
        .orchestrator
        .reject_qr(&session_id, &request.app_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "QR status", skip_all)]
pub async fn qr_status<U, S>(
    State(state): State<AppState<U, S>>,
    query: Result<Query<QrStatusQuery>, QueryRejection>,
) -> Result<Json<QrStatusResponse>, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Query(query) = query?;
    let session_id = parse_session_id(query.session_id, AuthApiError::SessionNotFound)?;

    let status = state.orchestrator.qr_status(&session_id).await?;

    Ok(Json(QrStatusResponse {
        session_id: status.session_id,
        status: status.status,
        message: status.message,
        token: status.token,
        user: status.user,
    }))
}
