use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub endpoint: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub api_key: String,
    pub app_name: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub predict: PredictConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let api_key = std::env::var("API_KEY")?;
        let app_name = std::env::var("APP_NAME").unwrap_or_else(|_| "raydx".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1440),
        };
        let mail = MailConfig {
            endpoint: std::env::var("MAIL_ENDPOINT")?,
            from: std::env::var("MAIL_FROM")?,
        };
        let predict = PredictConfig {
            endpoint: std::env::var("PREDICT_ENDPOINT")?,
        };
        Ok(Self {
            database_url,
            api_key,
            app_name,
            jwt,
            mail,
            predict,
        })
    }
}
