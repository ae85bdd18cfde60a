use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One emailed reset code. A row is rotated in place on resend rather than
/// replaced, so its id stays stable for the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub code: i32,
    pub used: bool,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    Active,
    Expired,
    Used,
}

impl VerificationCode {
    /// `used` wins over expiry: a consumed row never goes back to Expired.
    pub fn state(&self, now: OffsetDateTime) -> CodeState {
        if self.used {
            CodeState::Used
        } else if now > self.expires_at {
            CodeState::Expired
        } else {
            CodeState::Active
        }
    }
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    email: &str,
    code: i32,
    expires_at: OffsetDateTime,
) -> Result<VerificationCode, sqlx::Error> {
    sqlx::query_as::<_, VerificationCode>(
        r#"
        INSERT INTO verification_codes (user_id, email, code, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, email, code, used, created_at, expires_at
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(code)
    .bind(expires_at)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<VerificationCode>, sqlx::Error> {
    sqlx::query_as::<_, VerificationCode>(
        r#"
        SELECT id, user_id, email, code, used, created_at, expires_at
        FROM verification_codes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Lookup used by confirm: exact code value, not yet consumed. Expiry is
/// checked by the caller so it can report it distinctly.
pub async fn find_active(
    db: &PgPool,
    email: &str,
    code: i32,
) -> Result<Option<VerificationCode>, sqlx::Error> {
    sqlx::query_as::<_, VerificationCode>(
        r#"
        SELECT id, user_id, email, code, used, created_at, expires_at
        FROM verification_codes
        WHERE email = $1 AND code = $2 AND used = false
        "#,
    )
    .bind(email)
    .bind(code)
    .fetch_optional(db)
    .await
}

pub async fn mark_used(db: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE verification_codes SET used = true WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Overwrites code and expiry and re-arms the row. Single statement, so
/// concurrent resends serialize on the row.
pub async fn rotate(
    db: &PgPool,
    id: Uuid,
    code: i32,
    expires_at: OffsetDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE verification_codes
        SET code = $1, expires_at = $2, used = false
        WHERE id = $3
        "#,
    )
    .bind(code)
    .bind(expires_at)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn row(used: bool, expires_in: Duration) -> VerificationCode {
        let now = OffsetDateTime::now_utc();
        VerificationCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            code: 123456,
            used,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn fresh_row_is_active() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(row(false, Duration::minutes(10)).state(now), CodeState::Active);
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(row(false, Duration::minutes(-1)).state(now), CodeState::Expired);
    }

    #[test]
    fn used_wins_over_expiry() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(row(true, Duration::minutes(10)).state(now), CodeState::Used);
        assert_eq!(row(true, Duration::minutes(-1)).state(now), CodeState::Used);
    }

    #[test]
    fn boundary_is_inclusive() {
        // A row expiring exactly now is still honored.
        let code = row(false, Duration::ZERO);
        assert_eq!(code.state(code.expires_at), CodeState::Active);
        assert_eq!(
            code.state(code.expires_at + Duration::seconds(1)),
            CodeState::Expired
        );
    }
}
