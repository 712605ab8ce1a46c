//! Crate-level integration and BDD tests.

use serde_json::json;

use crate::delegate::LocalTransport;
use crate::dispatcher::Dispatcher;
use crate::interceptor::Interceptor;
use crate::options::Options;
use crate::resolver::PathResolver;
use crate::{Params, delegate_fn};


#[tokio::test]
async fn shared_definitions_dispatch_locally() {
    let dispatcher = Dispatcher::new();
    dispatcher.register_resolver(PathResolver).expect("resolver");
    dispatcher
        .define(json!({
            "math": {
                "add": {"url": "/math/add", "method": "post"}
            }
        }))
        .expect("define");
    let mut implementations = crate::DelegateMap::new();
    implementations.insert(
        "math.add".into(),
        delegate_fn(|params, _| async move {
            let sum: i64 = params.values().filter_map(serde_json::Value::as_i64).sum();
            Ok(json!(sum))
        }),
    );
    dispatcher.delegate(implementations).expect("delegate");
    dispatcher
        .use_interceptor(Interceptor::transport(LocalTransport))
        .expect("local transport");

    let mut params = Params::new();
    params.insert("a".into(), json!(2));
    params.insert("b".into(), json!(3));
    let reply = dispatcher
        .request("math.add", params, Options::new())
        .await
        .expect("delegate answers");
    assert_eq!(reply, json!(5));
}
