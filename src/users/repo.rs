use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Closed two-value role set; stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Standard,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "administrator" => Some(Role::Administrator),
            "standard" => Some(Role::Standard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, profile, password_hash, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, profile, password_hash, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list(db: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, profile, password_hash, created_at
        FROM users
        ORDER BY created_at
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn create(
    db: &PgPool,
    full_name: &str,
    email: &str,
    profile: Role,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (full_name, email, profile, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, full_name, email, profile, password_hash, created_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(profile)
    .bind(password_hash)
    .fetch_one(db)
    .await
}

/// Profile update; the password column is left untouched.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
    profile: Role,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = $1, email = $2, profile = $3
        WHERE id = $4
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(profile)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn update_password_by_id(
    db: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_password_by_email(
    db: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
        .bind(password_hash)
        .bind(email)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_the_closed_set() {
        assert_eq!(Role::parse("administrator"), Some(Role::Administrator));
        assert_eq!(Role::parse("standard"), Some(Role::Standard));
        assert_eq!(Role::parse("Administrator"), None);
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn user_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Ada".into(),
            email: "ada@x.com".into(),
            profile: Role::Standard,
            password_hash: "secret-hash".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"profile\":\"standard\""));
    }
}
