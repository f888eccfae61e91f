//! Webhook sink: POSTs the notification as JSON to the account's URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{notify_text, LogSink, NotificationSink, SinkError};
use crate::repository::Repository;
use crate::schedule::Account;

#[derive(Debug, Serialize)]
struct Payload<'a> {
    account: &'a str,
    repository: &'a str,
    text: String,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    #[serde(default)]
    id: u64,
}

/// Posts to `account.webhook_url`; accounts without a URL fall back to a
/// [`LogSink`] dry run.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    fallback: LogSink,
}

impl WebhookSink {
    pub fn new(timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scuttlebutt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            fallback: LogSink::default(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, account: &Account, repository: &Repository) -> Result<u64, SinkError> {
        let Some(url) = account.webhook_url.as_deref() else {
            return self.fallback.send(account, repository).await;
        };

        let payload = Payload {
            account: &account.username,
            repository: repository.id.as_str(),
            text: notify_text(repository),
        };
        debug!(account = %account.username, webhook_url = %url, "sending webhook notification");

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // An empty body is fine; the receiver just did not assign an ID.
        let body = response.bytes().await?;
        let id = serde_json::from_slice::<Receipt>(&body)
            .map(|r| r.id)
            .unwrap_or(0);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryId;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repository() -> Repository {
        Repository::new(
            RepositoryId::parse("github.com/acme/widget").unwrap(),
            "https://github.com/acme/widget",
            "Widgets",
            "go",
        )
    }

    fn account(url: Option<String>) -> Account {
        Account {
            username: "go_trending".into(),
            language: "go".into(),
            webhook_url: url,
        }
    }

    #[tokio::test]
    async fn posts_payload_and_reads_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "account": "go_trending",
                "repository": "github.com/acme/widget",
                "text": "acme/widget - Widgets https://github.com/acme/widget"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 777})))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(Duration::from_secs(5)).unwrap();
        let id = sink
            .send(&account(Some(format!("{}/hook", server.uri()))), &repository())
            .await
            .unwrap();
        assert_eq!(id, 777);
    }

    #[tokio::test]
    async fn empty_response_body_yields_zero_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(Duration::from_secs(5)).unwrap();
        let id = sink
            .send(&account(Some(server.uri())), &repository())
            .await
            .unwrap();
        assert_eq!(id, 0);
    }

    #[tokio::test]
    async fn error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(Duration::from_secs(5)).unwrap();
        let err = sink
            .send(&account(Some(server.uri())), &repository())
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn account_without_url_is_a_dry_run() {
        let sink = WebhookSink::new(Duration::from_secs(5)).unwrap();
        let id = sink.send(&account(None), &repository()).await.unwrap();
        assert!(id > 0);
    }
}
