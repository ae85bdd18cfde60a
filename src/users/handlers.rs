use axum::extract::{FromRef, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::{AdminUser, ApiKey, AuthUser};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use crate::users::dto::{
    ChangePasswordRequest, CreateUserRequest, CreatedDetail, LoginDetail, LoginRequest,
    PasswordResetDetail, PublicUser, UpdatePasswordRequest, UpdateUserRequest, UserActionDetail,
    UserDetail, UsersDetail,
};
use crate::users::repo::{self, Role};
use crate::validate::{is_valid_email, require_non_empty};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add-user", post(create_user))
        .route("/login", post(login))
        .route("/get-user/:id", get(get_user))
        .route("/get-users", get(get_users))
        .route("/update-user/:id", put(update_user))
        .route("/update-password", patch(update_password))
        .route("/change-password/:id", patch(change_password))
        .route("/user/:id", delete(delete_user))
}

#[instrument(skip(state, payload))]
async fn create_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Envelope<CreatedDetail>>), ApiError> {
    require_non_empty("full_name", &payload.full_name)?;
    require_non_empty("email", &payload.email)?;
    require_non_empty("profile", &payload.profile)?;
    require_non_empty("password", &payload.password)?;

    let profile = Role::parse(&payload.profile).ok_or_else(|| {
        warn!(profile = %payload.profile, "invalid profile");
        ApiError::InvalidRole
    })?;
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::InvalidEmail);
    }

    if repo::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let hash = hash_password(&payload.password)?;
    // A concurrent registration can still slip past the existence check; the
    // unique constraint turns that insert into EmailTaken.
    let user = repo::create(&state.db, &payload.full_name, &payload.email, profile, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user added");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(CreatedDetail {
            message: "User added successfully".into(),
            user_id: user.id,
            status_code: 201,
        })),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    _api_key: ApiKey,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginDetail>>, ApiError> {
    let user = repo::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::UserNotFound
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login wrong password");
        return Err(ApiError::WrongPassword);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.full_name, &user.email, user.profile)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(Envelope::new(LoginDetail {
        message: "User logged in successfully".into(),
        user_id: user.id,
        user_full_name: user.full_name,
        token,
        status_code: 200,
    })))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<UserDetail>>, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(Envelope::new(UserDetail {
        message: "User found".into(),
        user: PublicUser::from(user),
        status_code: 200,
    })))
}

#[instrument(skip(state))]
async fn get_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Envelope<UsersDetail>>, ApiError> {
    let users = repo::list(&state.db).await?;
    if users.is_empty() {
        return Err(ApiError::NotFound("Users not found"));
    }
    Ok(Json(Envelope::new(UsersDetail {
        message: "Users found".into(),
        users: users.into_iter().map(PublicUser::from).collect(),
        status_code: 200,
    })))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Envelope<UserActionDetail>>, ApiError> {
    require_non_empty("full_name", &payload.full_name)?;
    require_non_empty("email", &payload.email)?;
    require_non_empty("profile", &payload.profile)?;

    let profile = Role::parse(&payload.profile).ok_or(ApiError::InvalidRole)?;

    if repo::find_by_id(&state.db, id).await?.is_none() {
        warn!(user_id = %id, "update for unknown user");
        return Err(ApiError::UserNotFound);
    }

    if let Some(other) = repo::find_by_email(&state.db, &payload.email).await? {
        if other.id != id {
            warn!(email = %payload.email, "email belongs to another user");
            return Err(ApiError::EmailTaken);
        }
    }

    let updated = repo::update(&state.db, id, &payload.full_name, &payload.email, profile).await?;
    if updated == 0 {
        return Err(ApiError::UserNotFound);
    }

    info!(user_id = %id, "user updated");
    Ok(Json(Envelope::new(UserActionDetail {
        message: "User updated successfully".into(),
        user_id: id,
        status_code: 200,
    })))
}

/// Admin reset by email; no current-password proof required.
#[instrument(skip(state, payload))]
async fn update_password(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<Envelope<PasswordResetDetail>>, ApiError> {
    require_non_empty("email", &payload.email)?;
    require_non_empty("new_password", &payload.new_password)?;

    let user = repo::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let hash = hash_password(&payload.new_password)?;
    repo::update_password_by_id(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset by admin");
    Ok(Json(Envelope::new(PasswordResetDetail {
        message: "Password updated successfully".into(),
        user_email: user.email,
        status_code: 200,
    })))
}

#[instrument(skip(state, payload))]
async fn change_password(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Envelope<UserActionDetail>>, ApiError> {
    require_non_empty("current_password", &payload.current_password)?;
    require_non_empty("new_password", &payload.new_password)?;

    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %id, "wrong current password");
        return Err(ApiError::WrongCurrentPassword);
    }

    let hash = hash_password(&payload.new_password)?;
    repo::update_password_by_id(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(Envelope::new(UserActionDetail {
        message: "Password updated successfully".into(),
        user_id: user.id,
        status_code: 200,
    })))
}

#[instrument(skip(state))]
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<UserActionDetail>>, ApiError> {
    if repo::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::UserNotFound);
    }
    repo::delete(&state.db, id).await?;

    info!(user_id = %id, "user deleted");
    Ok(Json(Envelope::new(UserActionDetail {
        message: "User deleted successfully".into(),
        user_id: id,
        status_code: 200,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_user_serialization_shape() {
        let user = crate::users::repo::User {
            id: Uuid::new_v4(),
            full_name: "Ada".into(),
            email: "ada@x.com".into(),
            profile: Role::Administrator,
            password_hash: "hash".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).expect("serialize");
        assert_eq!(json["email"], "ada@x.com");
        assert_eq!(json["profile"], "administrator");
        assert!(json.get("password_hash").is_none());
    }
}
