use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::{Json, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::ApiKey;
use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use crate::verification::dto::{
    ConfirmDetail, ConfirmRequest, ForgotPasswordDetail, ForgotPasswordRequest, ResendRequest,
    SendCodeDetail,
};
use crate::verification::service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-verification-code/:email", post(send_code))
        .route("/resend-verification-code/:email", post(resend_code))
        .route("/confirm-code-verification/:email", post(confirm_code))
        .route("/forgot/update-password/:user_id", patch(forgot_password))
}

#[instrument(skip(state))]
async fn send_code(
    State(state): State<AppState>,
    _api_key: ApiKey,
    Path(email): Path<String>,
) -> Result<Json<Envelope<SendCodeDetail>>, ApiError> {
    let detail = service::send_verification_code(&state, &email).await?;
    Ok(Json(Envelope::new(detail)))
}

#[instrument(skip(state, payload))]
async fn resend_code(
    State(state): State<AppState>,
    _api_key: ApiKey,
    Path(email): Path<String>,
    Json(payload): Json<ResendRequest>,
) -> Result<Json<Envelope<SendCodeDetail>>, ApiError> {
    let detail =
        service::resend_verification_code(&state, &email, payload.id_verification).await?;
    Ok(Json(Envelope::new(detail)))
}

#[instrument(skip(state, payload))]
async fn confirm_code(
    State(state): State<AppState>,
    _api_key: ApiKey,
    Path(email): Path<String>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<Envelope<ConfirmDetail>>, ApiError> {
    let detail = service::confirm_code_verification(&state, &email, payload.code).await?;
    Ok(Json(Envelope::new(detail)))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    _api_key: ApiKey,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Envelope<ForgotPasswordDetail>>, ApiError> {
    let detail = service::forgot_update_password(
        &state,
        user_id,
        payload.id_verification,
        &payload.new_password,
    )
    .await?;
    Ok(Json(Envelope::new(detail)))
}
