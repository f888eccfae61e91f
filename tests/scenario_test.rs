mod helpers;

use chrono::Utc;
use helpers::{id, insert_repository, mention, FakeResolver};
use scuttlebutt::{Account, AccountStatus, AddOutcome, Store};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn repeated_mention_is_stored_once() {
    let resolver = FakeResolver::with(&[("github.com/a/x", "go")]);
    let store = Store::open_in_memory().unwrap().with_resolver(resolver);

    let first = store.add_message(mention("github.com/a/x", 1, "hi")).await.unwrap();
    let second = store.add_message(mention("github.com/a/x", 1, "hi")).await.unwrap();
    assert_eq!(first, AddOutcome::Created);
    assert_eq!(second, AddOutcome::Duplicate);

    let repo = store.get(&id("github.com/a/x")).unwrap().unwrap();
    assert_eq!(repo.messages.len(), 1);
    assert_eq!(repo.messages[0].id, 1);
    assert_eq!(repo.messages[0].text, "hi");
}

#[test]
fn top_repository_is_the_most_mentioned() {
    let store = Store::open_in_memory().unwrap();
    insert_repository(&store, "github.com/a/go1", "go", 1);
    insert_repository(&store, "github.com/a/go2", "go", 2);

    let top = store.top_repositories_by_language().unwrap();
    assert_eq!(top["go"].id, id("github.com/a/go2"));
}

#[test]
fn notified_repository_gives_way_to_next_best() {
    let store = Store::open_in_memory().unwrap();
    insert_repository(&store, "github.com/a/go1", "go", 1);
    let go2 = insert_repository(&store, "github.com/a/go2", "go", 2);

    store.mark_notified(&go2).unwrap();

    let top = store.top_repositories_by_language().unwrap();
    assert_eq!(top["go"].id, id("github.com/a/go1"));
}

#[tokio::test]
async fn unknown_repository_is_not_found_and_not_created() {
    let resolver = FakeResolver::with(&[]);
    let store = Store::open_in_memory().unwrap().with_resolver(resolver.clone());

    let err = store
        .add_message(mention("github.com/a/ghost", 1, "boo"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.get(&id("github.com/a/ghost")).unwrap(), None);
    assert_eq!(store.repositories().unwrap().len(), 0);
    assert_eq!(resolver.calls(), 1);
}

#[test]
fn account_becomes_due_again_after_interval() {
    let store = Store::open_in_memory().unwrap();
    let accounts = vec![Account::new("u1", "go")];
    let now = Utc::now();

    let due = store.notifiable_accounts_at(&accounts, HOUR, now).unwrap();
    assert_eq!(due.len(), 1);

    store
        .set_account_status("u1", &AccountStatus::notified_at(now))
        .unwrap();
    assert!(store
        .notifiable_accounts_at(&accounts, HOUR, now)
        .unwrap()
        .is_empty());

    let later = now + chrono::Duration::minutes(61);
    let due = store.notifiable_accounts_at(&accounts, HOUR, later).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].username, "u1");
}
