//! Most-mentioned eligible repository per language.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::repository::Repository;
use crate::store::{Snapshot, Store};

/// Language tag → the eligible repository with the most messages.
pub type TopRepositories = BTreeMap<String, Repository>;

/// Single pass over the snapshot in ascending ID order.
///
/// Blacklisted or notified repositories are skipped. A candidate is replaced
/// only by a strictly larger message count, so on ties the repository with the
/// lower ID is kept. The empty language is a bucket like any other.
pub fn top_repositories_by_language(snapshot: &Snapshot<'_>) -> Result<TopRepositories> {
    let blacklist = snapshot.blacklist_keys()?;
    let mut top = TopRepositories::new();

    snapshot.for_each_repository(|repo| {
        if repo.notified || blacklist.contains(repo.id.as_str()) {
            return;
        }
        let replace = top
            .get(&repo.language)
            .map_or(true, |current| repo.message_count() > current.message_count());
        if replace {
            top.insert(repo.language.clone(), repo);
        }
    })?;

    Ok(top)
}

impl Store {
    /// See [`top_repositories_by_language`].
    pub fn top_repositories_by_language(&self) -> Result<TopRepositories> {
        self.view(top_repositories_by_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Message, RepositoryId};

    fn put(store: &Store, id: &str, language: &str, messages: u64) -> RepositoryId {
        let id = RepositoryId::parse(id).unwrap();
        let mut repo = Repository::new(id.clone(), "", "lorem ipsum", language);
        for n in 1..=messages {
            repo.messages.push(Message::new(n, format!("mention {n}")));
        }
        store.put(&repo).unwrap();
        id
    }

    fn top_ids(store: &Store) -> BTreeMap<String, String> {
        store
            .top_repositories_by_language()
            .unwrap()
            .into_iter()
            .map(|(lang, r)| (lang, r.id.to_string()))
            .collect()
    }

    #[test]
    fn picks_highest_count_per_language() {
        let store = Store::open_in_memory().unwrap();
        put(&store, "github.com/a/go1", "go", 1);
        put(&store, "github.com/a/go2", "go", 2);
        put(&store, "github.com/a/js1", "javascript", 1);

        let top = top_ids(&store);
        assert_eq!(top.len(), 2);
        assert_eq!(top["go"], "github.com/a/go2");
        assert_eq!(top["javascript"], "github.com/a/js1");
    }

    #[test]
    fn ties_keep_the_lower_id() {
        let store = Store::open_in_memory().unwrap();
        put(&store, "github.com/b/second", "rust", 3);
        put(&store, "github.com/a/first", "rust", 3);

        assert_eq!(top_ids(&store)["rust"], "github.com/a/first");
    }

    #[test]
    fn empty_language_is_its_own_bucket() {
        let store = Store::open_in_memory().unwrap();
        put(&store, "github.com/a/plain", "", 1);
        put(&store, "github.com/a/go", "go", 5);

        let top = top_ids(&store);
        assert_eq!(top[""], "github.com/a/plain");
        assert_eq!(top["go"], "github.com/a/go");
    }

    #[test]
    fn notified_and_blacklisted_are_excluded() {
        let store = Store::open_in_memory().unwrap();
        put(&store, "github.com/a/go1", "go", 1);
        let go2 = put(&store, "github.com/a/go2", "go", 2);
        let go3 = put(&store, "github.com/a/go3", "go", 3);

        store.mark_notified(&go3).unwrap();
        store.add_to_blacklist(&go2).unwrap();
        assert_eq!(top_ids(&store)["go"], "github.com/a/go1");

        store.remove_from_blacklist(&go2).unwrap();
        assert_eq!(top_ids(&store)["go"], "github.com/a/go2");
    }

    #[test]
    fn zero_message_repositories_still_rank() {
        let store = Store::open_in_memory().unwrap();
        put(&store, "github.com/a/quiet", "c", 0);
        assert_eq!(top_ids(&store)["c"], "github.com/a/quiet");
    }

    #[test]
    fn empty_store_yields_empty_map() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.top_repositories_by_language().unwrap().is_empty());
    }
}
