//! Write path for mentions: dedup, resolver fallback, append.
//!
//! The resolver is a network call, so it never runs while the write lock is held.
//! [`Store::add_message`] first tries a short write transaction against the local
//! record; only on a miss does it call the resolver, and then it commits the new
//! record and the mention together in a second short transaction that re-checks
//! for a record created in the meantime.

use crate::error::{Result, StoreError};
use crate::repository::{Mention, Message, Repository, RepositoryId};

use super::{Store, WriteTx};

/// What [`Store::add_message`] did with a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The repository was resolved remotely, created, and the message appended.
    Created,
    /// The message was appended to an existing repository.
    Appended,
    /// A message with this ID was already stored; nothing changed.
    Duplicate,
}

impl Store {
    /// Record a mention, resolving the repository through the configured
    /// resolver if it is not cached locally.
    ///
    /// Repeated delivery of the same message ID is a successful no-op. A
    /// repository the resolver does not know yields [`StoreError::NotFound`];
    /// no record is created on any error.
    pub async fn add_message(&self, mention: Mention) -> Result<AddOutcome> {
        let Mention {
            repository_id: id,
            message,
        } = mention;
        if message.id == 0 {
            return Err(StoreError::InvalidArgument(format!(
                "empty message id for {id}"
            )));
        }

        let (cached_id, cached_msg) = (id.clone(), message.clone());
        let cached = self
            .blocking(move |store| {
                store.update(|tx| append_to_existing(tx, &cached_id, cached_msg))
            })
            .await?;
        if let Some(outcome) = cached {
            return Ok(outcome);
        }

        let resolved = self.resolve(&id).await?;

        self.blocking(move |store| store.update(|tx| insert_or_append(tx, resolved, message)))
            .await
    }

    /// Ask the resolver for metadata, bounded by the configured timeout.
    async fn resolve(&self, id: &RepositoryId) -> Result<Repository> {
        let Some(resolver) = self.resolver.as_ref() else {
            tracing::debug!(repository = %id, "no resolver configured");
            return Err(StoreError::NotFound(id.to_string()));
        };

        tracing::debug!(repository = %id, "resolving repository metadata");
        let found = tokio::time::timeout(self.resolver_timeout, resolver.resolve(id))
            .await
            .map_err(|_| StoreError::ResolverTimeout {
                id: id.to_string(),
                timeout: self.resolver_timeout,
            })?
            .map_err(|source| StoreError::Resolver {
                id: id.to_string(),
                source,
            })?;

        match found {
            Some(mut repo) => {
                // The key we were asked about wins over whatever the resolver echoes.
                repo.id = id.clone();
                repo.notified = false;
                repo.messages.clear();
                Ok(repo)
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

/// Append to a locally cached repository. `None` if there is no local record.
fn append_to_existing(
    tx: &WriteTx<'_>,
    id: &RepositoryId,
    message: Message,
) -> Result<Option<AddOutcome>> {
    let Some(mut repo) = tx.repository(id)? else {
        return Ok(None);
    };
    Ok(Some(append(tx, &mut repo, message)?))
}

/// Create `resolved` unless another writer stored the repository first, then append.
fn insert_or_append(
    tx: &WriteTx<'_>,
    resolved: Repository,
    message: Message,
) -> Result<AddOutcome> {
    match tx.repository(&resolved.id)? {
        Some(mut existing) => {
            tracing::debug!(
                repository = %existing.id,
                "repository created concurrently; using stored record"
            );
            append(tx, &mut existing, message)
        }
        None => {
            let mut repo = resolved;
            tx.append_message(&mut repo, message)?;
            tracing::info!(repository = %repo.id, language = %repo.language, "repository created");
            Ok(AddOutcome::Created)
        }
    }
}

fn append(tx: &WriteTx<'_>, repo: &mut Repository, message: Message) -> Result<AddOutcome> {
    let message_id = message.id;
    if tx.append_message(repo, message)? {
        tracing::debug!(repository = %repo.id, message_id, "message appended");
        Ok(AddOutcome::Appended)
    } else {
        tracing::debug!(repository = %repo.id, message_id, "duplicate message ignored");
        Ok(AddOutcome::Duplicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MetadataResolver, ResolveError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Counting {
        calls: AtomicUsize,
        language: &'static str,
    }

    #[async_trait]
    impl MetadataResolver for Counting {
        async fn resolve(
            &self,
            id: &RepositoryId,
        ) -> std::result::Result<Option<Repository>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut repo = Repository::new(id.clone(), "", "", self.language);
            // A resolver that returns junk messages must not leak them into the store.
            repo.messages.push(Message::new(99, "from resolver"));
            Ok(Some(repo))
        }
    }

    struct Slow;

    #[async_trait]
    impl MetadataResolver for Slow {
        async fn resolve(
            &self,
            _id: &RepositoryId,
        ) -> std::result::Result<Option<Repository>, ResolveError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    fn mention(id: &str, msg: u64) -> Mention {
        Mention {
            repository_id: RepositoryId::parse(id).unwrap(),
            message: Message::new(msg, "hi"),
        }
    }

    #[tokio::test]
    async fn creates_then_appends_then_dedups() {
        let resolver = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            language: "go",
        });
        let store = Store::open_in_memory().unwrap().with_resolver(resolver.clone());

        assert_eq!(
            store.add_message(mention("github.com/a/x", 1)).await.unwrap(),
            AddOutcome::Created
        );
        assert_eq!(
            store.add_message(mention("github.com/a/x", 2)).await.unwrap(),
            AddOutcome::Appended
        );
        assert_eq!(
            store.add_message(mention("github.com/a/x", 1)).await.unwrap(),
            AddOutcome::Duplicate
        );

        let repo = store.get(&RepositoryId::parse("github.com/a/x").unwrap()).unwrap().unwrap();
        let ids: Vec<u64> = repo.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(repo.language, "go");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_message_id_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let err = store.add_message(mention("github.com/a/x", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_resolver_means_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.add_message(mention("github.com/a/x", 1)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.repositories().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn slow_resolver_times_out_without_writing() {
        let store = Store::open_in_memory()
            .unwrap()
            .with_resolver(Arc::new(Slow))
            .with_resolver_timeout(Duration::from_millis(100));

        let err = store.add_message(mention("github.com/a/x", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::ResolverTimeout { .. }));
        assert_eq!(store.repositories().unwrap().len(), 0);
    }

    #[test]
    fn insert_or_append_prefers_concurrently_created_record() {
        let store = Store::open_in_memory().unwrap();
        let id = RepositoryId::parse("github.com/a/x").unwrap();
        let mut existing = Repository::new(id.clone(), "", "stored first", "rust");
        existing.messages.push(Message::new(1, "first"));
        store.put(&existing).unwrap();

        let resolved = Repository::new(id.clone(), "", "resolved later", "go");
        let outcome = store
            .update(|tx| insert_or_append(tx, resolved, Message::new(2, "second")))
            .unwrap();

        assert_eq!(outcome, AddOutcome::Appended);
        let repo = store.get(&id).unwrap().unwrap();
        assert_eq!(repo.description, "stored first");
        assert_eq!(repo.messages.len(), 2);
    }
}
