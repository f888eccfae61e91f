//! GitHub REST API resolver.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{MetadataResolver, ResolveError};
use crate::config::GitHubConfig;
use crate::repository::{Repository, RepositoryId};

const GITHUB_HOST: &str = "github.com";

/// Subset of the `GET /repos/{owner}/{repo}` response we keep.
#[derive(Debug, Deserialize)]
struct RepoResponse {
    html_url: Option<String>,
    description: Option<String>,
    language: Option<String>,
}

/// Resolves `github.com/owner/name` IDs against the GitHub API.
pub struct GitHubResolver {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubResolver {
    pub fn new(config: &GitHubConfig) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("scuttlebutt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl MetadataResolver for GitHubResolver {
    async fn resolve(&self, id: &RepositoryId) -> Result<Option<Repository>, ResolveError> {
        if !id.host().eq_ignore_ascii_case(GITHUB_HOST) {
            debug!(repository = %id, "not a GitHub repository");
            return Ok(None);
        }

        let url = format!("{}/repos/{}/{}", self.api_url, id.owner(), id.name());
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(repository = %id, "repository does not exist on GitHub");
            return Ok(None);
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let remaining = header(&response, "x-ratelimit-remaining");
            if remaining.as_deref() == Some("0") {
                let reset = header(&response, "x-ratelimit-reset").unwrap_or_default();
                warn!(repository = %id, reset = %reset, "GitHub rate limit exhausted");
                return Err(ResolveError::RateLimited { reset });
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let repo: RepoResponse = response.json().await?;
        debug!(repository = %id, language = ?repo.language, "resolved repository");

        Ok(Some(Repository::new(
            id.clone(),
            repo.html_url.unwrap_or_default(),
            repo.description.unwrap_or_default(),
            repo.language.unwrap_or_default(),
        )))
    }
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as match_header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer, token: Option<&str>) -> GitHubResolver {
        GitHubResolver::new(&GitHubConfig {
            api_url: server.uri(),
            token: token.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn id(s: &str) -> RepositoryId {
        RepositoryId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn resolves_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget"))
            .and(match_header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "html_url": "https://github.com/acme/widget",
                "description": "Widgets",
                "language": "Rust",
                "stargazers_count": 12
            })))
            .mount(&server)
            .await;

        let repo = resolver(&server, Some("secret"))
            .resolve(&id("github.com/acme/widget"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repo.id.as_str(), "github.com/acme/widget");
        assert_eq!(repo.url, "https://github.com/acme/widget");
        assert_eq!(repo.description, "Widgets");
        assert_eq!(repo.language, "Rust");
        assert!(repo.messages.is_empty());
    }

    #[tokio::test]
    async fn null_fields_become_empty_strings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/bare"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "html_url": "https://github.com/acme/bare",
                "description": null,
                "language": null
            })))
            .mount(&server)
            .await;

        let repo = resolver(&server, None)
            .resolve(&id("github.com/acme/bare"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repo.description, "");
        assert_eq!(repo.language, "");
    }

    #[tokio::test]
    async fn not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let found = resolver(&server, None)
            .resolve(&id("github.com/acme/ghost"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = resolver(&server, None)
            .resolve(&id("github.com/acme/widget"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000"),
            )
            .mount(&server)
            .await;

        let err = resolver(&server, None)
            .resolve(&id("github.com/acme/widget"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::RateLimited { ref reset } if reset == "1700000000"));
    }

    #[tokio::test]
    async fn other_hosts_are_not_found_without_a_request() {
        let server = MockServer::start().await;
        let found = resolver(&server, None)
            .resolve(&id("gitlab.com/acme/widget"))
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
