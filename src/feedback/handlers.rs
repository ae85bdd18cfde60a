use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, instrument};

use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, Envelope};
use crate::feedback::dto::{
    CreateFeedbackRequest, FeedbackCreatedDetail, FeedbackSummaryDetail, FeedbackTally,
};
use crate::feedback::repo::{self, Feedback};
use crate::state::AppState;
use crate::validate::require_non_empty;

pub fn router() -> Router<AppState> {
    Router::new().route("/feedback", post(create_feedback).get(get_feedback))
}

#[instrument(skip(state, payload))]
async fn create_feedback(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Json(payload): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Envelope<FeedbackCreatedDetail>>), ApiError> {
    require_non_empty("user_name", &payload.user_name)?;
    require_non_empty("feedback", &payload.feedback)?;
    require_non_empty("prediction_made", &payload.prediction_made)?;
    require_non_empty("correct_prediction", &payload.correct_prediction)?;

    let row = repo::insert(
        &state.db,
        &payload.user_name,
        &payload.feedback.to_lowercase(),
        &payload.prediction_made.to_lowercase(),
        &payload.correct_prediction.to_lowercase(),
    )
    .await?;

    info!(feedback_id = %row.id, "feedback added");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(FeedbackCreatedDetail {
            message: "Feedback added successfully".into(),
            feedback_id: row.id,
            status_code: 201,
        })),
    ))
}

#[instrument(skip(state))]
async fn get_feedback(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Envelope<FeedbackSummaryDetail>>, ApiError> {
    let rows = repo::list(&state.db).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("There are no saved feedbacks"));
    }
    Ok(Json(Envelope::new(FeedbackSummaryDetail {
        message: "Feedbacks found".into(),
        feedbacks: tally(&rows),
        status_code: 200,
    })))
}

/// Per-disease tallies; a row counts as correct when the reporter marked the
/// prediction correct.
fn tally(rows: &[Feedback]) -> BTreeMap<String, FeedbackTally> {
    let mut counts: BTreeMap<String, FeedbackTally> = BTreeMap::new();
    for row in rows {
        let entry = counts.entry(row.prediction_made.clone()).or_default();
        entry.total_quantity += 1;
        if row.correct_prediction == "yes" {
            entry.total_quantity_correct += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn row(disease: &str, correct: &str) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            user_name: "ada".into(),
            feedback: "looks right".into(),
            prediction_made: disease.into(),
            correct_prediction: correct.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn tallies_group_by_disease() {
        let rows = vec![
            row("pneumonia", "yes"),
            row("pneumonia", "no"),
            row("pneumonia", "yes"),
            row("tumor", "no"),
        ];
        let counts = tally(&rows);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["pneumonia"].total_quantity, 3);
        assert_eq!(counts["pneumonia"].total_quantity_correct, 2);
        assert_eq!(counts["tumor"].total_quantity, 1);
        assert_eq!(counts["tumor"].total_quantity_correct, 0);
    }

    #[test]
    fn only_yes_counts_as_correct() {
        let counts = tally(&[row("pneumonia", "maybe")]);
        assert_eq!(counts["pneumonia"].total_quantity, 1);
        assert_eq!(counts["pneumonia"].total_quantity_correct, 0);
    }

    #[test]
    fn empty_input_produces_empty_map() {
        assert!(tally(&[]).is_empty());
    }
}
