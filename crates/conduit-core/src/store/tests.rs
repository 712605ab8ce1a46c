//! Unit tests for the definition store.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::delegate::delegate_fn;

#[fixture]
fn store() -> DefinitionStore {
    let mut store = DefinitionStore::new();
    store
        .define(json!({
            "ping": {"url": "/ping", "method": "get"},
            "user": {
                "get": {"url": "/user/:id", "method": "get"},
                "posts": {"list": {"url": "/user/:id/posts"}}
            }
        }))
        .expect("definitions are valid");
    store
}

#[test]
fn partial_definitions_deep_merge() {
    let mut store = DefinitionStore::new();
    store.define(json!({"a": {"url": "/a"}})).expect("define url");
    store.define(json!({"a": {"method": "get"}})).expect("define method");

    assert_eq!(
        store.tree().get("a"),
        Some(&json!({"url": "/a", "method": "get", "topic": "a"}))
    );
}

#[rstest]
fn nested_topics_are_stamped_with_key_path(store: DefinitionStore) {
    assert_eq!(
        store.topics(),
        vec!["ping".to_owned(), "user.get".to_owned(), "user.posts.list".to_owned()]
    );
    let nested = store.tree()["user"]["posts"]["list"]["topic"].clone();
    assert_eq!(nested, json!("user.posts.list"));
}

#[test]
fn empty_placeholder_becomes_namespace_once_filled() {
    let mut store = DefinitionStore::new();
    store.define(json!({"user": {}})).expect("define placeholder");
    assert_eq!(store.topics(), vec!["user".to_owned()]);

    store
        .define(json!({"user": {"get": {"url": "/u", "method": "get"}}}))
        .expect("fill placeholder");

    assert_eq!(store.topics(), vec!["user.get".to_owned()]);
    assert_eq!(
        store.tree().get("user"),
        Some(&json!({"get": {"url": "/u", "method": "get", "topic": "user.get"}}))
    );
    let endpoint = store.lookup("user.get").expect("nested endpoint resolves");
    assert_eq!(endpoint.url(), Some("/u"));
    assert!(store.lookup("user").is_none());
}

#[test]
fn restamping_keeps_empty_leaf_an_endpoint() {
    let mut store = DefinitionStore::new();
    store.define(json!({"noop": {}})).expect("define empty leaf");
    store.define(json!({"other": {"url": "/o"}})).expect("define sibling");

    assert_eq!(store.tree().get("noop"), Some(&json!({"topic": "noop"})));
    assert_eq!(store.topics(), vec!["noop".to_owned(), "other".to_owned()]);
}

#[rstest]
#[case::top_level("ping", Some("/ping"))]
#[case::nested("user.get", Some("/user/:id"))]
#[case::deep("user.posts.list", Some("/user/:id/posts"))]
#[case::namespace("user", None)]
#[case::through_leaf("ping.url", None)]
#[case::unknown("user.delete", None)]
fn lookup_walks_dotted_paths(store: DefinitionStore, #[case] topic: &str, #[case] url: Option<&str>) {
    let found = store.lookup(topic);
    assert_eq!(found.as_ref().and_then(EndpointDefinition::url), url);
    if let Some(endpoint) = found {
        assert_eq!(endpoint.topic(), topic);
    }
}

#[test]
fn literal_dotted_key_wins_over_namespace_walk() {
    let mut store = DefinitionStore::new();
    store
        .define(json!({
            "a.b": {"url": "/literal"},
            "a": {"b": {"url": "/nested"}}
        }))
        .expect("definitions are valid");

    assert_eq!(store.lookup("a.b").and_then(|e| e.url().map(str::to_owned)), Some("/literal".to_owned()));
}

#[test]
fn arrays_merge_index_wise() {
    let mut store = DefinitionStore::new();
    store.define(json!({"a": {"url": "/a", "tags": ["x", "y"]}})).expect("first");
    store.define(json!({"a": {"tags": ["z"]}})).expect("second");

    assert_eq!(store.tree()["a"]["tags"], json!(["z", "y"]));

    store.define(json!({"a": {"tags": ["p", "q", "r"]}})).expect("third");
    assert_eq!(store.tree()["a"]["tags"], json!(["p", "q", "r"]));
}

#[test]
fn rejects_non_object_definitions() {
    let mut store = DefinitionStore::new();
    let error = store.define(json!(["ping"])).expect_err("arrays are rejected");
    assert!(matches!(error, DispatchError::InvalidRegistration { .. }));
}

#[rstest]
fn malformed_merge_leaves_store_unchanged(mut store: DefinitionStore) {
    let before = store.tree().clone();
    let error = store.define(json!({"ping": {"url": 42}})).expect_err("numeric url");

    assert!(matches!(error, DispatchError::InvalidDefinition { .. }));
    assert_eq!(store.tree(), &before);
}

#[rstest]
fn delegates_attach_only_to_defined_topics(mut store: DefinitionStore) {
    let mut implementations = DelegateMap::new();
    implementations.insert("user.get".into(), delegate_fn(|_, _| async { Ok(json!({"id": 1})) }));
    implementations.insert("missing".into(), delegate_fn(|_, _| async { Ok(json!(null)) }));

    assert_eq!(store.delegate(implementations), 1);
    assert!(store.lookup("user.get").and_then(|e| e.delegate().cloned()).is_some());
    assert!(store.lookup("ping").and_then(|e| e.delegate().cloned()).is_none());
}

#[rstest]
fn endpoints_lists_each_leaf(store: DefinitionStore) {
    assert_eq!(store.len(), 3);
    assert_eq!(store.endpoints().len(), 3);
}
