//! Crate-level tests for route binding.

use conduit_core::{DelegateMap, Dispatcher, Options, Params, PathResolver, delegate_fn};
use serde_json::{Value, json};

use crate::{RouteError, RouteRegistrar, RouteTable, bind_routes};


fn dispatcher(definitions: Value) -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher.register_resolver(PathResolver).expect("resolver");
    dispatcher.define(definitions).expect("definitions");
    dispatcher
}

fn echo_delegates(topics: &[&str]) -> DelegateMap {
    topics
        .iter()
        .map(|topic| {
            let implementation = delegate_fn(|params: Params, _: Options| async move { Ok(Value::Object(params)) });
            ((*topic).to_owned(), implementation)
        })
        .collect()
}

#[test]
fn delegated_endpoints_without_method_are_refused() {
    let dispatcher = dispatcher(json!({"orphan": {"url": "/orphan"}}));
    dispatcher.delegate(echo_delegates(&["orphan"])).expect("delegate");

    let error = bind_routes(&dispatcher, &mut RouteTable::new()).expect_err("no method");
    assert!(matches!(error, RouteError::InvalidRoute { ref topic, .. } if topic == "orphan"));
}

#[test]
fn registrar_errors_propagate() {
    struct Refusing;

    impl RouteRegistrar for Refusing {
        fn register(&mut self, method: &str, path: &str, _: crate::EndpointRoute) -> Result<(), RouteError> {
            Err(RouteError::DuplicateRoute {
                method: method.to_owned(),
                path: path.to_owned(),
            })
        }
    }

    let dispatcher = dispatcher(json!({"ping": {"url": "/ping", "method": "get"}}));
    dispatcher.delegate(echo_delegates(&["ping"])).expect("delegate");

    let error = bind_routes(&dispatcher, &mut Refusing).expect_err("registrar refuses");
    assert!(matches!(error, RouteError::DuplicateRoute { ref path, .. } if path == "/ping"));
}

#[tokio::test]
async fn nested_topics_bind_with_base_and_dispatcher_options() {
    let dispatcher = dispatcher(json!({"user": {"get": {"url": "/user/:id", "method": "get"}}}));
    dispatcher.set("base", json!("/v1")).expect("base");
    dispatcher.set("tenant", json!("acme")).expect("tenant");
    let mut delegates = DelegateMap::new();
    delegates.insert(
        "user.get".to_owned(),
        delegate_fn(|params: Params, options: Options| async move {
            Ok(json!({"id": params.get("id").cloned(), "tenant": options.get("tenant").cloned()}))
        }),
    );
    dispatcher.delegate(delegates).expect("delegate");

    let mut table = RouteTable::new();
    assert_eq!(bind_routes(&dispatcher, &mut table).expect("bind"), 1);
    let reply = table.serve("GET", "/v1/user/7", Params::new(), true).await;
    assert_eq!(reply, crate::RouteReply::Json(json!({"id": "7", "tenant": "acme"})));
}
