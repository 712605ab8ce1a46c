//! URL template expansion and matching.
//!
//! Templates use `:name` for a required segment and `:name?` for an optional
//! one. Parameter names are word characters and must not start with a digit,
//! so `host:8080` stays literal. When an optional parameter is absent the
//! slash in front of it is dropped as well.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::Value;
use thiserror::Error;

use crate::Params;

/// Characters left unescaped, matching URI component encoding.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Required template parameters absent from the parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing template parameters: {}", .names.join(", "))]
pub struct MissingParams {
    /// Missing names in template order.
    pub names: Vec<String>,
}

/// Expands `template`, consuming substituted parameters from `params`.
///
/// # Errors
///
/// Returns [`MissingParams`] when a required parameter is absent.
///
/// # Example
///
/// ```
/// use conduit_core::{Params, template};
/// use serde_json::json;
///
/// let mut params = Params::new();
/// params.insert("id".into(), json!(5));
/// let url = template::expand("/user/:id", &mut params).expect("id is present");
/// assert_eq!(url, "/user/5");
/// assert!(params.is_empty());
/// ```
pub fn expand(template: &str, params: &mut Params) -> Result<String, MissingParams> {
    expand_with(template, params, true)
}

/// Expands `template`, removing substituted parameters only when `consume`
/// is set.
///
/// Scanning continues past a missing parameter so every missing name is
/// reported.
///
/// # Errors
///
/// Returns [`MissingParams`] when a required parameter is absent.
pub fn expand_with(template: &str, params: &mut Params, consume: bool) -> Result<String, MissingParams> {
    let mut output = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut rest = template;

    while let Some(colon) = rest.find(':') {
        let (literal, tail) = rest.split_at(colon);
        output.push_str(literal);
        let Some(placeholder) = Placeholder::parse(tail) else {
            output.push(':');
            rest = tail.get(1..).unwrap_or_default();
            continue;
        };
        rest = tail.get(placeholder.len..).unwrap_or_default();

        let found = if consume {
            params.remove(placeholder.name)
        } else {
            params.get(placeholder.name).cloned()
        };
        match found {
            Some(value) => {
                if placeholder.slash {
                    output.push('/');
                }
                output.push_str(&encode_value(&value));
            }
            None if placeholder.optional => {
                if !placeholder.slash && output.ends_with('/') {
                    output.pop();
                }
            }
            None => {
                missing.push(placeholder.name.to_owned());
                output.push_str(tail.get(..placeholder.len).unwrap_or_default());
            }
        }
    }
    output.push_str(rest);

    if !missing.is_empty() {
        return Err(MissingParams { names: missing });
    }
    if output.is_empty() && template.starts_with('/') {
        output.push('/');
    }
    Ok(output)
}

/// Matches `path` against `template`, returning the captured parameters.
///
/// Placeholders are recognised exactly as [`expand_with`] recognises them, so
/// a capture may sit between literals inside one segment (`/file/:name.json`)
/// and the `:/name` slash marker is honoured. Optional placeholders may be
/// absent together with the slash in front of them. A capture never spans a
/// `/`. Captured values are percent-decoded strings. Leading and trailing
/// slashes and the query string are ignored. Returns `None` when the path
/// does not fit.
#[must_use]
pub fn match_path(template: &str, path: &str) -> Option<Params> {
    let tokens = tokenize(template.trim_matches('/'));
    let target = path.split('?').next().unwrap_or_default().trim_matches('/');
    let mut captured = Params::new();
    match_tokens(&tokens, target, &mut captured).then_some(captured)
}

enum Token<'a> {
    Literal(&'a str),
    Capture(Placeholder<'a>),
}

/// Splits a template into literals and placeholders. The slash in front of
/// an optional placeholder is folded into it, mirroring how expansion drops
/// that slash when the parameter is absent.
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(colon) = rest.find(':') {
        let (literal, tail) = rest.split_at(colon);
        tokens.push(Token::Literal(literal));
        let Some(mut placeholder) = Placeholder::parse(tail) else {
            tokens.push(Token::Literal(tail.get(..1).unwrap_or_default()));
            rest = tail.get(1..).unwrap_or_default();
            continue;
        };
        rest = tail.get(placeholder.len..).unwrap_or_default();
        if placeholder.optional
            && !placeholder.slash
            && let Some(Token::Literal(text)) = tokens.last_mut()
            && let Some(stripped) = text.strip_suffix('/')
        {
            *text = stripped;
            placeholder.slash = true;
        }
        tokens.push(Token::Capture(placeholder));
    }
    tokens.push(Token::Literal(rest));
    tokens
}

/// Longest capture first, backtracking until the remaining tokens fit.
fn match_tokens(tokens: &[Token<'_>], path: &str, captured: &mut Params) -> bool {
    let Some((token, remaining)) = tokens.split_first() else {
        return path.is_empty();
    };
    match token {
        Token::Literal(text) => path
            .strip_prefix(*text)
            .is_some_and(|tail| match_tokens(remaining, tail, captured)),
        Token::Capture(placeholder) => {
            let after_marker = if placeholder.slash {
                path.strip_prefix('/')
            } else {
                Some(path)
            };
            if let Some(body) = after_marker {
                let segment_end = body.find('/').unwrap_or(body.len());
                for end in (1..=segment_end).rev() {
                    let (Some(raw), Some(tail)) = (body.get(..end), body.get(end..)) else {
                        continue;
                    };
                    let Ok(decoded) = percent_decode_str(raw).decode_utf8() else {
                        continue;
                    };
                    if match_tokens(remaining, tail, captured) {
                        captured.insert(placeholder.name.to_owned(), Value::String(decoded.into_owned()));
                        return true;
                    }
                }
            }
            placeholder.optional && match_tokens(remaining, path, captured)
        }
    }
}

/// A `:name` placeholder found at the start of a template tail.
struct Placeholder<'a> {
    name: &'a str,
    slash: bool,
    optional: bool,
    len: usize,
}

impl<'a> Placeholder<'a> {
    /// Parses `:` `/`? name `?`? at the start of `tail`.
    fn parse(tail: &'a str) -> Option<Self> {
        let after_colon = tail.strip_prefix(':')?;
        let stripped = after_colon.strip_prefix('/');
        let slash = stripped.is_some();
        let body = stripped.unwrap_or(after_colon);
        let name_len = word_prefix_len(body);
        if name_len == 0 {
            return None;
        }
        let name = body.get(..name_len)?;
        let optional = body.get(name_len..)?.starts_with('?');
        let len = 1 + usize::from(slash) + name_len + usize::from(optional);
        Some(Self {
            name,
            slash,
            optional,
            len,
        })
    }
}

fn word_prefix_len(text: &str) -> usize {
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return 0;
    }
    text.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count()
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(text) => utf8_percent_encode(text, COMPONENT).to_string(),
        Value::Array(items) => {
            let joined = items.iter().map(scalar_text).collect::<Vec<_>>().join(",");
            utf8_percent_encode(&joined, COMPONENT).to_string()
        }
        other => utf8_percent_encode(&scalar_text(other), COMPONENT).to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
