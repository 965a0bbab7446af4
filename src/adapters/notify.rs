use crate::domain::ports::Notifier;
use crate::utils::error::{Result, SignupError};
use async_trait::async_trait;
use reqwest::Client;

/// Posts the confirmation-mail payload to the mail service. Template
/// rendering happens on the service side; we only ship the data.
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, to: &str, template_data: &serde_json::Value) -> Result<()> {
        let body = serde_json::json!({
            "to": to,
            "template_data": template_data,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SignupError::Notification {
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(SignupError::Notification {
                message: format!("mail service returned {}", response.status()),
            });
        }
        Ok(())
    }
}
