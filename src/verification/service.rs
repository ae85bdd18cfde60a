use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo as users_repo;
use crate::validate::{is_valid_email, require_non_empty};
use crate::verification::dto::{ConfirmDetail, ForgotPasswordDetail, SendCodeDetail};
use crate::verification::repo::{self, CodeState};

/// A code stays honorable for ten minutes from (re)issue.
pub const CODE_TTL: Duration = Duration::minutes(10);

fn generate_code() -> i32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

/// Resend keeps the code of an Active row and draws fresh for anything else.
fn code_for_resend(state: CodeState, existing: i32, fresh: i32) -> i32 {
    match state {
        CodeState::Active => existing,
        CodeState::Expired | CodeState::Used => fresh,
    }
}

/// Row checks applied by confirm, in order: exact value (the lookup already
/// filtered on it; this guards against a changed lookup contract), then
/// expiry. Leaves the row untouched on failure.
fn check_confirm(
    row: &crate::verification::repo::VerificationCode,
    submitted: i32,
    now: OffsetDateTime,
) -> Result<(), ApiError> {
    if row.code != submitted {
        return Err(ApiError::CodeMismatch);
    }
    if now > row.expires_at {
        return Err(ApiError::CodeExpired);
    }
    Ok(())
}

/// The finalizer's gate: only `used` matters. Expiry is intentionally not
/// consulted, so a code confirmed just before expiry stays honorable after.
fn check_reset_gate(used: bool) -> Result<(), ApiError> {
    if !used {
        return Err(ApiError::CodeNotVerified);
    }
    Ok(())
}

async fn user_for_email(state: &AppState, email: &str) -> Result<users_repo::User, ApiError> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::InvalidEmail);
    }
    users_repo::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "no user for email");
            ApiError::UserNotFound
        })
}

/// Issues a brand-new code row. Deliberately not idempotent: every call mails
/// and persists a fresh row, without looking for an existing active one.
pub async fn send_verification_code(
    state: &AppState,
    email: &str,
) -> Result<SendCodeDetail, ApiError> {
    let user = user_for_email(state, email).await?;

    let code = generate_code();
    state
        .mailer
        .send_verification_code(&user.full_name, email, code, &state.config.app_name)
        .await
        .map_err(|e| {
            error!(error = %e, email = %email, "verification mail failed");
            ApiError::MailDelivery
        })?;

    let expires_at = OffsetDateTime::now_utc() + CODE_TTL;
    let row = repo::insert(&state.db, user.id, email, code, expires_at).await?;

    info!(id_verification = %row.id, email = %email, "verification code sent");
    Ok(SendCodeDetail {
        message: "Verification code sent successfully".into(),
        email: email.to_string(),
        id_verification: row.id,
        verification_code: code,
        status_code: 200,
    })
}

/// Resend against a known row id. A missing row falls back to a full send
/// (graceful degradation, not an error); a Used or Expired row is re-armed
/// with a fresh code; an Active row is resent as-is with a refreshed window.
pub async fn resend_verification_code(
    state: &AppState,
    email: &str,
    id_verification: Uuid,
) -> Result<SendCodeDetail, ApiError> {
    let user = user_for_email(state, email).await?;

    let Some(row) = repo::find_by_id(&state.db, id_verification).await? else {
        info!(id_verification = %id_verification, "row missing, issuing new code");
        let mut detail = send_verification_code(state, email).await?;
        detail.message = "New Verification code sent successfully".into();
        return Ok(detail);
    };

    let now = OffsetDateTime::now_utc();
    let code = code_for_resend(row.state(now), row.code, generate_code());

    state
        .mailer
        .send_verification_code(&user.full_name, email, code, &state.config.app_name)
        .await
        .map_err(|e| {
            error!(error = %e, email = %email, "verification mail failed");
            ApiError::MailDelivery
        })?;

    repo::rotate(&state.db, row.id, code, now + CODE_TTL).await?;

    info!(id_verification = %row.id, email = %email, "verification code resent");
    Ok(SendCodeDetail {
        message: "Existing verification code sent successfully".into(),
        email: email.to_string(),
        id_verification: row.id,
        verification_code: code,
        status_code: 200,
    })
}

/// Confirms a submitted code and consumes the row. The only transition that
/// sets `used = true`.
pub async fn confirm_code_verification(
    state: &AppState,
    email: &str,
    submitted: i32,
) -> Result<ConfirmDetail, ApiError> {
    let user = user_for_email(state, email).await?;

    let row = repo::find_active(&state.db, email, submitted)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "no matching unused code");
            ApiError::CodeNotFound
        })?;

    check_confirm(&row, submitted, OffsetDateTime::now_utc()).map_err(|e| {
        warn!(id_verification = %row.id, error = %e, "code rejected");
        e
    })?;

    repo::mark_used(&state.db, row.id).await?;

    info!(id_verification = %row.id, user_id = %user.id, "code confirmed");
    Ok(ConfirmDetail {
        message: "Code verification with success".into(),
        id_verification: row.id,
        user_id: user.id,
        user_email: email.to_string(),
        status_code: 200,
    })
}

/// Final reset step: requires the referenced row to have been confirmed.
/// Expiry is intentionally not re-checked here; only `used` gates the write.
pub async fn forgot_update_password(
    state: &AppState,
    user_id: Uuid,
    id_verification: Uuid,
    new_password: &str,
) -> Result<ForgotPasswordDetail, ApiError> {
    require_non_empty("new_password", new_password)?;

    let user = users_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let row = repo::find_by_id(&state.db, id_verification)
        .await?
        .ok_or_else(|| {
            warn!(id_verification = %id_verification, "unknown verification row");
            ApiError::InvalidCode
        })?;

    check_reset_gate(row.used).map_err(|e| {
        warn!(id_verification = %row.id, "code not confirmed yet");
        e
    })?;

    let hash = hash_password(new_password)?;
    let updated = users_repo::update_password_by_email(&state.db, &user.email, &hash).await?;
    if updated == 0 {
        return Err(ApiError::Internal(anyhow::anyhow!(
            "password update affected no rows"
        )));
    }

    info!(user_id = %user.id, "password reset finalized");
    Ok(ForgotPasswordDetail {
        message: "Password updated successfully".into(),
        user_id,
        status_code: 200,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert!((100_000..=999_999).contains(&code), "out of range: {code}");
        }
    }

    #[test]
    fn active_row_keeps_its_code_on_resend() {
        assert_eq!(code_for_resend(CodeState::Active, 111111, 222222), 111111);
    }

    #[test]
    fn used_and_expired_rows_get_a_fresh_code() {
        assert_eq!(code_for_resend(CodeState::Used, 111111, 222222), 222222);
        assert_eq!(code_for_resend(CodeState::Expired, 111111, 222222), 222222);
    }

    fn active_row(code: i32) -> crate::verification::repo::VerificationCode {
        let now = OffsetDateTime::now_utc();
        crate::verification::repo::VerificationCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            code,
            used: false,
            created_at: now,
            expires_at: now + CODE_TTL,
        }
    }

    #[test]
    fn confirm_accepts_the_exact_code_before_expiry() {
        let row = active_row(123456);
        let now = OffsetDateTime::now_utc();
        assert!(check_confirm(&row, 123456, now).is_ok());
    }

    #[test]
    fn confirm_rejects_a_wrong_code_and_leaves_the_row_active() {
        let row = active_row(123456);
        let now = OffsetDateTime::now_utc();
        let err = check_confirm(&row, 654321, now).unwrap_err();
        assert!(matches!(err, ApiError::CodeMismatch));
        assert_eq!(row.state(now), CodeState::Active);
    }

    #[test]
    fn confirm_rejects_an_expired_row() {
        let row = active_row(123456);
        let after_expiry = row.expires_at + Duration::seconds(1);
        let err = check_confirm(&row, 123456, after_expiry).unwrap_err();
        assert!(matches!(err, ApiError::CodeExpired));
    }

    #[test]
    fn reset_gate_requires_a_confirmed_code() {
        let err = check_reset_gate(false).unwrap_err();
        assert!(matches!(err, ApiError::CodeNotVerified));
        assert!(check_reset_gate(true).is_ok());
    }

    #[test]
    fn reset_gate_ignores_expiry_once_confirmed() {
        // A row confirmed before expiry stays honorable afterwards: the gate
        // sees only the used flag, so time never enters the decision.
        let mut row = active_row(123456);
        row.used = true;
        let long_after = row.expires_at + Duration::hours(48);
        assert_eq!(row.state(long_after), CodeState::Used);
        assert!(check_reset_gate(row.used).is_ok());
    }
}
