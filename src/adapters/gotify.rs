use async_trait::async_trait;
use reqwest::Client;

use crate::domain::ports::NotificationSink;
use crate::utils::error::{DigestError, Result};

/// Pushes the digest to a Gotify server as one message.
pub struct GotifySink {
    client: Client,
    message_url: String,
    token: String,
}

impl GotifySink {
    pub fn new(client: Client, origin: &str, token: &str) -> Self {
        Self {
            client,
            message_url: format!("{}/message", origin.trim_end_matches('/')),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for GotifySink {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        tracing::debug!("📨 POST {}", self.message_url);
        let response = self
            .client
            .post(&self.message_url)
            .query(&[("token", self.token.as_str())])
            .form(&[("title", title), ("message", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DigestError::NotificationError {
                message: format!("HTTP {}: {}", status, detail.trim()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_posts_form_with_token() {
        let server = MockServer::start();
        let push = server.mock(|when, then| {
            when.method(POST)
                .path("/message")
                .query_param("token", "app-token")
                .x_www_form_urlencoded_tuple("title", "16/10/2026")
                .x_www_form_urlencoded_tuple("message", "TOTAL: 0\n");
            then.status(200).json_body(serde_json::json!({"id": 1}));
        });

        let sink = GotifySink::new(Client::new(), &server.base_url(), "app-token");
        sink.send("16/10/2026", "TOTAL: 0\n").await.unwrap();

        push.assert();
    }

    #[tokio::test]
    async fn test_rejected_token_is_a_notification_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/message");
            then.status(401).body("{\"error\":\"Unauthorized\"}");
        });

        let sink = GotifySink::new(Client::new(), &format!("{}/", server.base_url()), "bad");
        let err = sink.send("t", "m").await.unwrap_err();

        assert!(matches!(err, DigestError::NotificationError { ref message } if message.contains("401")));
    }
}
