use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::{Role, User};

/// Request body for user registration (admin only).
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub profile: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for a profile update; the password is never touched here.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub email: String,
    pub profile: String,
}

/// Admin password reset, keyed by email, no current-password check.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub new_password: String,
}

/// Self-service password change; the caller must prove the current password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile: Role,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            profile: user.profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedDetail {
    pub message: String,
    pub user_id: Uuid,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct LoginDetail {
    pub message: String,
    pub user_id: Uuid,
    pub user_full_name: String,
    pub token: String,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub message: String,
    pub user: PublicUser,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct UsersDetail {
    pub message: String,
    pub users: Vec<PublicUser>,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct UserActionDetail {
    pub message: String,
    pub user_id: Uuid,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
pub struct PasswordResetDetail {
    pub message: String,
    pub user_email: String,
    pub status_code: u16,
}
