#![allow(dead_code)]

use async_trait::async_trait;
use scuttlebutt::resolver::{MetadataResolver, ResolveError};
use scuttlebutt::{Message, Mention, Repository, RepositoryId, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn id(s: &str) -> RepositoryId {
    RepositoryId::parse(s).unwrap()
}

pub fn mention(repository: &str, message_id: u64, text: &str) -> Mention {
    Mention {
        repository_id: id(repository),
        message: Message::new(message_id, text),
    }
}

/// Store a repository with `messages` sequentially numbered mentions.
pub fn insert_repository(
    store: &Store,
    repository: &str,
    language: &str,
    messages: u64,
) -> RepositoryId {
    let description = format!("{repository} description");
    let mut repo = Repository::new(id(repository), "", description, language);
    for n in 1..=messages {
        repo.messages.push(Message::new(n, format!("mention {n}")));
    }
    store.put(&repo).unwrap();
    repo.id
}

/// In-memory resolver with a fixed catalogue of `id -> language`. Counts calls.
#[derive(Default)]
pub struct FakeResolver {
    known: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn with(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            known: entries
                .iter()
                .map(|(id, lang)| (id.to_string(), lang.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataResolver for FakeResolver {
    async fn resolve(&self, id: &RepositoryId) -> Result<Option<Repository>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.known.get(id.as_str()).map(|language| {
            Repository::new(
                id.clone(),
                format!("https://{id}"),
                format!("{} resolved", id.name()),
                language.as_str(),
            )
        }))
    }
}

/// Resolver that always fails with a server error.
pub struct BrokenResolver;

#[async_trait]
impl MetadataResolver for BrokenResolver {
    async fn resolve(&self, _id: &RepositoryId) -> Result<Option<Repository>, ResolveError> {
        Err(ResolveError::Status {
            status: 500,
            body: "internal error".into(),
        })
    }
}
