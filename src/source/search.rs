//! JSON search API client, shaped like the classic status search endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use super::{MessageSource, Poll, SourceError};
use crate::config::SourceConfig;
use crate::repository::{Mention, Message, RepositoryId};

const GITHUB_HOST: &str = "github.com";

/// Owners that are GitHub site sections rather than accounts.
const RESERVED_OWNERS: &[&str] = &["blog", "explore"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: u64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    entities: Entities,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    urls: Vec<UrlEntity>,
}

#[derive(Debug, Deserialize)]
struct UrlEntity {
    #[serde(default)]
    expanded_url: Option<String>,
}

pub struct SearchSource {
    client: Client,
    url: String,
    query: String,
    token: Option<String>,
}

impl SearchSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("scuttlebutt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            query: config.query.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl MessageSource for SearchSource {
    async fn poll(&self, since_id: u64) -> Result<Poll, SourceError> {
        let mut params = vec![("q", self.query.clone())];
        if since_id > 0 {
            params.push(("since_id", since_id.to_string()));
        }
        let url = Url::parse_with_params(&self.url, &params).map_err(SourceError::Url)?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let results: SearchResponse = response.json().await?;
        let mut poll = Poll::default();
        for status in results.statuses {
            poll.max_id = poll.max_id.max(Some(status.id));
            match mention_from_status(status) {
                Some(mention) => poll.mentions.push(mention),
                None => trace!("status mentions no repository"),
            }
        }

        debug!(
            since_id,
            mentions = poll.mentions.len(),
            max_id = ?poll.max_id,
            "search poll complete"
        );
        Ok(poll)
    }
}

/// First URL in the status that names a repository wins.
fn mention_from_status(status: Status) -> Option<Mention> {
    let repository_id = status
        .entities
        .urls
        .iter()
        .filter_map(|u| u.expanded_url.as_deref())
        .find_map(extract_repository_id)?;

    Some(Mention {
        repository_id,
        message: Message::new(status.id, status.text),
    })
}

/// Extract `github.com/owner/name` from a repository URL.
///
/// The URL is lowercased and must have exactly two path segments (a trailing
/// slash is tolerated). Site sections such as `/blog/...` are not repositories.
pub fn extract_repository_id(raw: &str) -> Option<RepositoryId> {
    let url = Url::parse(&raw.to_lowercase()).ok()?;
    let host = url.host_str()?;
    if host != GITHUB_HOST && host != "www.github.com" {
        return None;
    }

    let path = url.path().strip_suffix('/').unwrap_or(url.path());
    let mut segments = path.strip_prefix('/')?.split('/');
    let (owner, name) = (segments.next()?, segments.next()?);
    if segments.next().is_some() || RESERVED_OWNERS.contains(&owner) {
        return None;
    }

    RepositoryId::parse(&format!("{GITHUB_HOST}/{owner}/{name}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extracted(raw: &str) -> Option<String> {
        extract_repository_id(raw).map(String::from)
    }

    #[test]
    fn extracts_owner_and_name() {
        assert_eq!(
            extracted("https://github.com/acme/widget").as_deref(),
            Some("github.com/acme/widget")
        );
        assert_eq!(
            extracted("https://GitHub.com/Acme/Widget/").as_deref(),
            Some("github.com/acme/widget")
        );
        assert_eq!(
            extracted("http://www.github.com/acme/widget?tab=readme").as_deref(),
            Some("github.com/acme/widget")
        );
    }

    #[test]
    fn rejects_non_repository_urls() {
        for raw in [
            "https://github.com/acme",
            "https://github.com/acme/widget/issues/1",
            "https://github.com/blog/1234-announcement",
            "https://github.com/explore/trending",
            "https://gitlab.com/acme/widget",
            "https://github.com//widget",
            "not a url",
            "",
        ] {
            assert_eq!(extracted(raw), None, "{raw}");
        }
    }

    fn status(id: u64, urls: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "text": format!("status {id}"),
            "entities": {
                "urls": urls
                    .iter()
                    .map(|u| serde_json::json!({"expanded_url": u}))
                    .collect::<Vec<_>>()
            }
        })
    }

    fn source(server: &MockServer) -> SearchSource {
        SearchSource::new(&SourceConfig {
            url: format!("{}/search", server.uri()),
            token: Some("tok".into()),
            query: "github.com".into(),
            poll_interval_secs: 30,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn poll_returns_first_repository_per_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "github.com"))
            .and(query_param("since_id", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statuses": [
                    status(
                        101,
                        &[
                            "https://example.com/x",
                            "https://github.com/a/one",
                            "https://github.com/a/two",
                        ]
                    ),
                    status(105, &["https://example.com/nothing"]),
                    status(103, &["https://github.com/b/three"]),
                ]
            })))
            .mount(&server)
            .await;

        let poll = source(&server).poll(100).await.unwrap();
        let got: Vec<(String, u64)> = poll
            .mentions
            .iter()
            .map(|m| (m.repository_id.to_string(), m.message.id))
            .collect();
        assert_eq!(
            got,
            vec![
                ("github.com/a/one".to_string(), 101),
                ("github.com/b/three".to_string(), 103)
            ]
        );
        assert_eq!(poll.mentions[0].message.text, "status 101");
        assert_eq!(poll.max_id, Some(105));
    }

    #[tokio::test]
    async fn first_poll_omits_since_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"statuses": []})),
            )
            .mount(&server)
            .await;

        let poll = source(&server).poll(0).await.unwrap();
        assert_eq!(poll, Poll::default());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].url.query().unwrap_or("").contains("since_id"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = source(&server).poll(0).await.unwrap_err();
        assert!(
            matches!(err, SourceError::Status { status: 429, ref body } if body == "slow down")
        );
    }
}
