//! Unit tests for the resolver chain.

use std::sync::Arc;

use serde_json::json;

use super::*;

fn declining() -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().times(1).returning(|_, _| None);
    resolver
}

fn answering(url: &'static str) -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .times(1)
        .returning(move |topic, _| (topic == "ping").then(|| EndpointDefinition::new(topic).with_url(url)));
    resolver
}

#[test]
fn empty_chain_reports_no_resolvers() {
    let error = ResolverChain::new()
        .resolve("ping", &DefinitionStore::new())
        .expect_err("no resolvers");
    assert!(matches!(error, DispatchError::NoResolvers));
}

#[test]
fn first_non_empty_result_wins() {
    let mut never = MockResolver::new();
    never.expect_resolve().never();

    let mut chain = ResolverChain::new();
    chain.push(Arc::new(declining()));
    chain.push(Arc::new(answering("/first")));
    chain.push(Arc::new(never));

    let endpoint = chain
        .resolve("ping", &DefinitionStore::new())
        .expect("second resolver answers");
    assert_eq!(endpoint.url(), Some("/first"));
}

#[test]
fn exhausted_chain_names_topic_and_count() {
    let mut chain = ResolverChain::new();
    chain.push(Arc::new(declining()));
    chain.push(Arc::new(declining()));

    let error = chain
        .resolve("ghost", &DefinitionStore::new())
        .expect_err("nobody knows ghost");
    match error {
        DispatchError::TopicUndefined { topic, resolvers } => {
            assert_eq!(topic, "ghost");
            assert_eq!(resolvers, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn path_resolver_reads_the_store() {
    let mut store = DefinitionStore::new();
    store
        .define(json!({"user": {"get": {"url": "/user/:id"}}}))
        .expect("valid definitions");

    assert_eq!(
        PathResolver.resolve("user.get", &store).map(|e| e.topic().to_owned()),
        Some("user.get".to_owned())
    );
    assert!(PathResolver.resolve("user", &store).is_none());
}

#[test]
fn closures_are_resolvers() {
    let fallback = |topic: &str, _: &DefinitionStore| Some(EndpointDefinition::new(topic));
    let mut chain = ResolverChain::new();
    chain.push(Arc::new(PathResolver));
    chain.push(Arc::new(fallback));

    let endpoint = chain
        .resolve("anything", &DefinitionStore::new())
        .expect("fallback accepts every topic");
    assert_eq!(endpoint.topic(), "anything");
}
