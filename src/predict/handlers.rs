use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::predict::predictor::Detection;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    prediction: Vec<Detection>,
}

#[instrument(skip(state, multipart))]
async fn predict(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let image = read_upload(&mut multipart).await?;

    let prediction = state.predictor.infer(image).await.map_err(|e| {
        warn!(error = %e, "inference rejected image");
        ApiError::InvalidImage
    })?;

    info!(user_id = %claims.user_id, findings = prediction.len(), "prediction served");
    Ok(Json(PredictionResponse { prediction }))
}

/// Pulls the uploaded file out of the multipart body; an absent or unreadable
/// part is reported as a bad image.
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidImage)?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let bytes = field.bytes().await.map_err(|_| ApiError::InvalidImage)?;
            if bytes.is_empty() {
                return Err(ApiError::InvalidImage);
            }
            return Ok(bytes);
        }
    }
    Err(ApiError::InvalidImage)
}
