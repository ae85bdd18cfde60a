use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a resend request: the row id handed out by the original send.
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub id_verification: Uuid,
}

/// Body of a confirm request.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub code: i32,
}

/// Body of the final forgot-password step.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub id_verification: Uuid,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeDetail {
    pub message: String,
    pub email: String,
    pub id_verification: Uuid,
    pub verification_code: i32,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct ConfirmDetail {
    pub message: String,
    pub id_verification: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordDetail {
    pub message: String,
    pub user_id: Uuid,
    pub status_code: u16,
}
