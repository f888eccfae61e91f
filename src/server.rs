//! Read-only HTTP surface over the store.
//!
//! Routes: `/` index, `/top` per-language ranking as text, `/top/stats` ranking
//! timings, `/repositories` and `/blacklist` as JSON, `/backup` a database copy.

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::StoreError;
use crate::store::Store;
use crate::tasks::Shutdown;

/// Store errors rendered as a plain-text 500.
#[derive(Debug)]
pub struct AppError(StoreError);

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

/// One row of `/repositories`.
#[derive(Debug, Serialize)]
pub struct RepositorySummary {
    pub id: String,
    pub description: String,
    pub language: String,
    pub notified: bool,
    pub messages: usize,
}

pub fn build_router(store: Store) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/top", get(top))
        .route("/top/stats", get(top_stats))
        .route("/repositories", get(repositories))
        .route("/blacklist", get(blacklist))
        .route("/backup", get(backup))
        .with_state(store)
}

/// Serve until `shutdown` flips to `true`.
pub async fn serve(store: Store, addr: &str, mut shutdown: Shutdown) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "HTTP server listening at http://{addr}/");

    axum::serve(listener, build_router(store))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(concat!(
        "<h1>scuttlebutt</h1>\n",
        "<p><a href=\"/top\">Top Repositories by Language</a></p>\n",
        "<p><a href=\"/repositories\">All Repositories</a></p>\n",
        "<p><a href=\"/blacklist\">Blacklist</a></p>\n",
    ))
}

/// `language: owner/name - description`, one line per language, sorted.
pub async fn top(State(store): State<Store>) -> Result<String, AppError> {
    let top = store
        .blocking(|s| s.top_repositories_by_language())
        .await?;
    let mut out = String::new();
    for (language, repo) in &top {
        let _ = writeln!(out, "{language}: {} - {}", repo.name(), repo.description);
    }
    Ok(out)
}

pub async fn top_stats(State(store): State<Store>) -> Result<String, AppError> {
    let (count, top_elapsed, count_elapsed) = store
        .blocking(|s| {
            let started = Instant::now();
            s.top_repositories_by_language()?;
            let top_elapsed = started.elapsed();

            let started = Instant::now();
            let count = s.view(|snap| snap.repository_count())?;
            Ok((count, top_elapsed, started.elapsed()))
        })
        .await?;

    let per_repo = top_elapsed
        .checked_div(u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or_default();
    Ok(format!(
        "repositories: {count}\ntop time: {top_elapsed:?} ({per_repo:?} per repo)\ncount time: {count_elapsed:?}\n"
    ))
}

pub async fn repositories(
    State(store): State<Store>,
) -> Result<Json<Vec<RepositorySummary>>, AppError> {
    let rows = store
        .blocking(|s| {
            let mut rows = Vec::new();
            s.for_each_repository(|r| {
                rows.push(RepositorySummary {
                    messages: r.message_count(),
                    id: r.id.to_string(),
                    description: r.description,
                    language: r.language,
                    notified: r.notified,
                })
            })?;
            Ok(rows)
        })
        .await?;
    Ok(Json(rows))
}

pub async fn blacklist(State(store): State<Store>) -> Result<Json<Vec<String>>, AppError> {
    let ids = store.blocking(|s| s.blacklist()).await?;
    Ok(Json(ids.into_iter().map(String::from).collect()))
}

static BACKUP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A consistent copy of the database, as a download.
pub async fn backup(State(store): State<Store>) -> Result<Response, AppError> {
    let dest = std::env::temp_dir().join(format!(
        "scuttlebutt-backup-{}-{}.db",
        std::process::id(),
        BACKUP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let path = dest.clone();
    store.blocking(move |s| s.backup_to(&path)).await?;
    let bytes = tokio::fs::read(&dest).await.map_err(StoreError::from);
    if let Err(e) = tokio::fs::remove_file(&dest).await {
        tracing::warn!(path = %dest.display(), error = %e, "failed to remove backup temp file");
    }
    let bytes = bytes?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"scuttlebutt.db\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
