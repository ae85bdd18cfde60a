use anyhow::Context;
use axum::async_trait;
use serde_json::json;

use crate::config::MailConfig;

/// Outbound mail, behind a trait so tests can inject a fake.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(
        &self,
        recipient_name: &str,
        recipient_email: &str,
        code: i32,
        app_name: &str,
    ) -> anyhow::Result<()>;
}

/// Delivers through the external mail-compose service: a single JSON POST,
/// no retries. A non-2xx reply counts as a failed dispatch.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            from: config.from.clone(),
        }
    }
}

fn compose_payload(
    from: &str,
    recipient_name: &str,
    recipient_email: &str,
    code: i32,
    app_name: &str,
) -> serde_json::Value {
    json!({
        "from": from,
        "to": recipient_email,
        "subject": format!("Password recovery {app_name}"),
        "context": {
            "user": recipient_name,
            "code_verification": code,
        },
        "template": "main",
    })
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_verification_code(
        &self,
        recipient_name: &str,
        recipient_email: &str,
        code: i32,
        app_name: &str,
    ) -> anyhow::Result<()> {
        let payload = compose_payload(&self.from, recipient_name, recipient_email, code, app_name);
        self.client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("mail-compose request")?
            .error_for_status()
            .context("mail-compose response status")?;
        Ok(())
    }
}
