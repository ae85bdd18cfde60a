use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use tracing::warn;

use super::jwt::{Claims, JwtKeys};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::Role;

/// Tier (a): the static shared secret required on every route. Absence and a
/// wrong value are reported differently on purpose.
#[derive(Debug)]
pub struct ApiKey;

#[async_trait]
impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get("api_key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingApiKey)?;
        if provided != state.config.api_key {
            warn!("rejected request with wrong api key");
            return Err(ApiError::InvalidApiKey);
        }
        Ok(ApiKey)
    }
}

/// Tier (b): api key plus a valid, unexpired bearer token.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        ApiKey::from_request_parts(parts, state).await?;

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(ApiError::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!("rejected request with bad token");
            e
        })?;
        Ok(AuthUser(claims))
    }
}

/// Tier (c): everything in `AuthUser` plus the administrator role claim.
#[derive(Debug)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.profile != Role::Administrator {
            warn!(user_id = %claims.user_id, "non-admin on admin route");
            return Err(ApiError::AdminOnly);
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with_headers(headers: &[(&str, String)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        let (parts, _body) = builder.body(()).expect("request").into_parts();
        parts
    }

    fn token_for(state: &AppState, profile: Role) -> String {
        JwtKeys::from_ref(state)
            .sign(Uuid::new_v4(), "Test User", "test@x.com", profile)
            .expect("sign")
    }

    #[test]
    fn extractors_are_debug_formattable() {
        // Instrumented handlers record extractor arguments via Debug.
        let claims = crate::auth::jwt::Claims {
            user_id: Uuid::new_v4(),
            full_name: "Test User".into(),
            email: "test@x.com".into(),
            profile: Role::Standard,
            exp: 0,
        };
        assert!(format!("{:?}", ApiKey).contains("ApiKey"));
        assert!(format!("{:?}", AuthUser(claims.clone())).contains("AuthUser"));
        assert!(format!("{:?}", AdminUser(claims)).contains("AdminUser"));
    }

    #[tokio::test]
    async fn api_key_absent_vs_wrong_value() {
        let state = AppState::fake();

        let mut parts = parts_with_headers(&[]);
        let err = ApiKey::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));

        let mut parts = parts_with_headers(&[("api_key", "nope".into())]);
        let err = ApiKey::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidApiKey));

        let mut parts = parts_with_headers(&[("api_key", "test-api-key".into())]);
        assert!(ApiKey::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn auth_user_requires_bearer_token() {
        let state = AppState::fake();

        let mut parts = parts_with_headers(&[("api_key", "test-api-key".into())]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));

        let token = token_for(&state, Role::Standard);
        let mut parts = parts_with_headers(&[
            ("api_key", "test-api-key".into()),
            ("authorization", format!("Bearer {token}")),
        ]);
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("valid token accepted");
        assert_eq!(claims.profile, Role::Standard);
    }

    #[tokio::test]
    async fn admin_tier_rejects_standard_profile() {
        let state = AppState::fake();
        let token = token_for(&state, Role::Standard);
        let mut parts = parts_with_headers(&[
            ("api_key", "test-api-key".into()),
            ("authorization", format!("Bearer {token}")),
        ]);
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AdminOnly));

        let token = token_for(&state, Role::Administrator);
        let mut parts = parts_with_headers(&[
            ("api_key", "test-api-key".into()),
            ("authorization", format!("Bearer {token}")),
        ]);
        assert!(AdminUser::from_request_parts(&mut parts, &state)
            .await
            .is_ok());
    }
}
