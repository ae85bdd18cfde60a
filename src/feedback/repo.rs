use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub user_name: String,
    pub feedback: String,
    pub prediction_made: String,
    pub correct_prediction: String,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_name: &str,
    feedback: &str,
    prediction_made: &str,
    correct_prediction: &str,
) -> Result<Feedback, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedback (user_name, feedback, prediction_made, correct_prediction)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_name, feedback, prediction_made, correct_prediction, created_at
        "#,
    )
    .bind(user_name)
    .bind(feedback)
    .bind(prediction_made)
    .bind(correct_prediction)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, user_name, feedback, prediction_made, correct_prediction, created_at
        FROM feedback
        ORDER BY created_at
        "#,
    )
    .fetch_all(db)
    .await
}
