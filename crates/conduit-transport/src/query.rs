//! Nested query-string encoding.
//!
//! Objects and arrays flatten into bracketed keys: `{"options": {"perPage":
//! 25}}` becomes `options[perPage]=25` and `{"list": ["a"]}` becomes
//! `list[0]=a`. Empty objects and arrays contribute nothing; `null` encodes
//! as an empty value.

use conduit_core::Params;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes `params` as a query string without the leading `?`.
#[must_use]
pub fn encode(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(encode_component(key), value, &mut pairs);
    }
    pairs.join("&")
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            for (key, nested) in fields {
                flatten(format!("{prefix}[{}]", encode_component(key)), nested, pairs);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), nested, pairs);
            }
        }
        Value::Null => pairs.push(format!("{prefix}=")),
        Value::String(text) => pairs.push(format!("{prefix}={}", encode_component(text))),
        other => pairs.push(format!("{prefix}={other}")),
    }
}

fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, QUERY_COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::flat(json!({"page": 2, "q": "a b"}), "page=2&q=a%20b")]
    #[case::nested(json!({"options": {"perPage": 25}}), "options[perPage]=25")]
    #[case::list(json!({"list": ["item1", "item2"]}), "list[0]=item1&list[1]=item2")]
    #[case::deep(json!({"f": {"tags": ["x"]}}), "f[tags][0]=x")]
    #[case::null(json!({"cursor": null}), "cursor=")]
    #[case::empty_container(json!({"none": {}, "nothing": []}), "")]
    #[case::reserved(json!({"a&b": "c=d"}), "a%26b=c%3Dd")]
    fn encodes_bracket_style(#[case] input: Value, #[case] expected: &str) {
        let Value::Object(params) = input else {
            panic!("fixture must be an object");
        };
        assert_eq!(encode(&params), expected);
    }
}
