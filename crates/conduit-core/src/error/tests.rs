//! Unit tests for dispatch error types.

use rstest::rstest;
use serde_json::Map;

use super::*;

fn snapshot(topic: &str) -> RequestSnapshot {
    RequestSnapshot {
        topic: topic.into(),
        url: Some("/ping".into()),
        method: Some("get".into()),
        transport: "http".into(),
        params: Map::new(),
        meta: Map::new(),
    }
}

#[test]
fn topic_undefined_names_topic_and_resolver_count() {
    let message = DispatchError::topic_undefined("user.get", 2).to_string();
    assert!(message.contains("user.get"), "expected topic in: {message}");
    assert!(message.contains('2'), "expected resolver count in: {message}");
}

#[test]
fn missing_parameters_lists_every_name() {
    let error = DispatchError::missing_parameters("post", vec!["userId".into(), "postId".into()]);
    let message = error.to_string();
    assert!(message.contains("userId, postId"), "got: {message}");
}

#[rstest]
#[case::no_resolvers(DispatchError::NoResolvers, ErrorCategory::Configuration)]
#[case::unresolved(DispatchError::unresolved("ping"), ErrorCategory::Configuration)]
#[case::topic(DispatchError::topic_undefined("ping", 1), ErrorCategory::Resolution)]
#[case::parameter(
    DispatchError::missing_parameters("ping", vec!["id".into()]),
    ErrorCategory::Parameter
)]
#[case::transport(
    DispatchError::from(TransportError::new(TransportErrorKind::Connect, "refused")),
    ErrorCategory::Transport
)]
#[case::interceptor(DispatchError::interceptor("nope"), ErrorCategory::Interceptor)]
#[case::internal(DispatchError::internal("poisoned"), ErrorCategory::Internal)]
fn categories_follow_the_taxonomy(#[case] error: DispatchError, #[case] expected: ErrorCategory) {
    assert_eq!(error.category(), expected);
}

#[test]
fn annotation_is_transparent_to_inspection() {
    let inner = TransportError::new(TransportErrorKind::Status, "not ok")
        .with_status(500)
        .with_path("/api/ping");
    let error = DispatchError::from(inner).annotate(snapshot("ping"));

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.category(), ErrorCategory::Transport);
    assert!(matches!(error.root(), DispatchError::Transport(_)));
    assert_eq!(error.request().map(|r| r.topic.as_str()), Some("ping"));
    assert!(error.to_string().contains("status 500"));
}

#[rstest]
#[case::not_found(404, true, false)]
#[case::server(503, false, true)]
#[case::ok(200, false, false)]
fn transport_status_classes(#[case] status: u16, #[case] client: bool, #[case] server: bool) {
    let error = TransportError::new(TransportErrorKind::Status, "not ok").with_status(status);
    assert_eq!(error.is_client_error(), client);
    assert_eq!(error.is_server_error(), server);
}

#[test]
fn timeout_reports_budget() {
    let error = TransportError::timeout(250);
    assert!(error.is_timeout());
    assert!(error.to_string().contains("250ms"));
}

#[test]
fn dispatch_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DispatchError>();
}
