use axum::extract::FromRef;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::Role;

/// JWT payload. Carries the full identity so protected handlers never need a
/// user lookup just to know who is calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile: Role,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl_minutes: i64,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }
}

impl JwtKeys {
    pub fn sign(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
        profile: Role,
    ) -> anyhow::Result<String> {
        let exp = OffsetDateTime::now_utc() + Duration::minutes(self.ttl_minutes);
        let claims = Claims {
            user_id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            profile,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Decodes and validates a token, reporting expiry distinctly from every
    /// other kind of invalidity.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.user_id, "jwt verified");
                Ok(data.claims)
            }
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                Err(ApiError::TokenExpired)
            }
            Err(_) => Err(ApiError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(ttl_minutes: i64) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(b"test-secret"),
            decoding: DecodingKey::from_secret(b"test-secret"),
            ttl_minutes,
        }
    }

    #[test]
    fn sign_and_verify_roundtrip_preserves_claims() {
        let keys = make_keys(1440);
        let user_id = Uuid::new_v4();
        let token = keys
            .sign(user_id, "Ada Lovelace", "ada@x.com", Role::Administrator)
            .expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.full_name, "Ada Lovelace");
        assert_eq!(claims.email, "ada@x.com");
        assert_eq!(claims.profile, Role::Administrator);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Expiry far enough in the past to clear the default leeway.
        let keys = make_keys(-5);
        let token = keys
            .sign(Uuid::new_v4(), "Ada", "ada@x.com", Role::Standard)
            .expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::TokenExpired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let keys = make_keys(1440);
        let token = keys
            .sign(Uuid::new_v4(), "Ada", "ada@x.com", Role::Standard)
            .expect("sign");
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ttl_minutes: 1440,
        };
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }
}
