//! Normalization of workflow callback bodies.
//!
//! Workflow engines are loose about body shape, so parsing is lenient:
//!
//! - an array-wrapped body has its first element unwrapped
//! - `spread_html` is also accepted as `spreadHtml` or `spread`
//! - empty strings, `null`, and non-string values count as absent
//! - the session id is trimmed; an empty id counts as missing

use serde_json::Value;

use crate::errors::{RelayError, Result};
use crate::message::{Fragment, SessionId};

/// Keys accepted for the spread field, in priority order.
pub const SPREAD_KEYS: [&str; 3] = ["spread_html", "spreadHtml", "spread"];

/// A validated callback: a session id plus a non-empty fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressRequest {
    /// Routing key.
    pub session_id: SessionId,
    /// The content to deliver.
    pub fragment: Fragment,
}

impl IngressRequest {
    /// Parse and validate a raw JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON body.
    ///
    /// The session id is checked before the fragment, so a body missing both
    /// reports [`RelayError::MissingSessionId`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let body = unwrap_array(value);
        let session_id = body
            .and_then(|b| b.get("sessionId"))
            .and_then(session_id_from)
            .ok_or(RelayError::MissingSessionId)?;

        let fragment = Fragment {
            text: body.and_then(|b| b.get("text")).and_then(non_empty_str),
            spread_html: body.and_then(spread_from),
        };
        if fragment.is_empty() {
            return Err(RelayError::EmptyFragment);
        }

        Ok(Self {
            session_id,
            fragment,
        })
    }
}

/// Normalize a session id from a path or query parameter.
pub fn normalize_session_id(raw: &str) -> Option<SessionId> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn unwrap_array(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn session_id_from(value: &Value) -> Option<SessionId> {
    match value {
        Value::String(s) => normalize_session_id(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn spread_from(body: &Value) -> Option<String> {
    SPREAD_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(non_empty_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: &Value) -> Result<IngressRequest> {
        IngressRequest::from_value(value)
    }

    #[test]
    fn text_only() {
        let req = parse(&json!({"sessionId": "s1", "text": "Reply"})).unwrap();
        assert_eq!(req.session_id, "s1");
        assert_eq!(req.fragment, Fragment::text("Reply"));
    }

    #[test]
    fn spread_only() {
        let req = parse(&json!({"sessionId": "s1", "spread_html": "<div/>"})).unwrap();
        assert_eq!(req.fragment, Fragment::spread("<div/>"));
    }

    #[test]
    fn both_fields() {
        let req = parse(&json!({"sessionId": "s1", "text": "t", "spread_html": "s"})).unwrap();
        assert_eq!(req.fragment.text.as_deref(), Some("t"));
        assert_eq!(req.fragment.spread_html.as_deref(), Some("s"));
    }

    #[test]
    fn camel_case_alias() {
        let req = parse(&json!({"sessionId": "s1", "spreadHtml": "<p/>"})).unwrap();
        assert_eq!(req.fragment.spread_html.as_deref(), Some("<p/>"));
    }

    #[test]
    fn short_alias() {
        let req = parse(&json!({"sessionId": "s1", "spread": "<p/>"})).unwrap();
        assert_eq!(req.fragment.spread_html.as_deref(), Some("<p/>"));
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let req = parse(&json!({
            "sessionId": "s1",
            "spread": "alias",
            "spread_html": "canonical",
        }))
        .unwrap();
        assert_eq!(req.fragment.spread_html.as_deref(), Some("canonical"));
    }

    #[test]
    fn empty_canonical_falls_through_to_alias() {
        let req = parse(&json!({"sessionId": "s1", "spread_html": "", "spread": "alias"})).unwrap();
        assert_eq!(req.fragment.spread_html.as_deref(), Some("alias"));
    }

    #[test]
    fn array_body_is_unwrapped() {
        let req = parse(&json!([{"sessionId": "s1", "text": "x"}, {"sessionId": "s2"}])).unwrap();
        assert_eq!(req.session_id, "s1");
    }

    #[test]
    fn empty_array_is_missing_session() {
        assert!(matches!(parse(&json!([])), Err(RelayError::MissingSessionId)));
    }

    #[test]
    fn missing_session_id() {
        assert!(matches!(
            parse(&json!({"text": "x"})),
            Err(RelayError::MissingSessionId)
        ));
    }

    #[test]
    fn blank_session_id_is_missing() {
        assert!(matches!(
            parse(&json!({"sessionId": "   ", "text": "x"})),
            Err(RelayError::MissingSessionId)
        ));
    }

    #[test]
    fn session_id_is_trimmed() {
        let req = parse(&json!({"sessionId": "  abc \n", "text": "x"})).unwrap();
        assert_eq!(req.session_id, "abc");
    }

    #[test]
    fn numeric_session_id_accepted() {
        let req = parse(&json!({"sessionId": 42, "text": "x"})).unwrap();
        assert_eq!(req.session_id, "42");
    }

    #[test]
    fn missing_both_fields_is_empty_fragment() {
        assert!(matches!(
            parse(&json!({"sessionId": "s1"})),
            Err(RelayError::EmptyFragment)
        ));
    }

    #[test]
    fn empty_strings_and_nulls_are_absent() {
        assert!(matches!(
            parse(&json!({"sessionId": "s1", "text": "", "spread_html": null})),
            Err(RelayError::EmptyFragment)
        ));
    }

    #[test]
    fn non_string_content_is_absent() {
        assert!(matches!(
            parse(&json!({"sessionId": "s1", "text": 5, "spread": {"a": 1}})),
            Err(RelayError::EmptyFragment)
        ));
    }

    #[test]
    fn missing_session_reported_before_empty_fragment() {
        assert!(matches!(parse(&json!({})), Err(RelayError::MissingSessionId)));
    }

    #[test]
    fn non_object_body_is_missing_session() {
        assert!(matches!(
            parse(&json!("just a string")),
            Err(RelayError::MissingSessionId)
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = IngressRequest::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, RelayError::MalformedRequestBody { .. }));
    }

    #[test]
    fn from_slice_happy_path() {
        let req = IngressRequest::from_slice(br#"{"sessionId":"X","text":"hi"}"#).unwrap();
        assert_eq!(req.session_id, "X");
    }

    #[test]
    fn normalize_session_id_rules() {
        assert_eq!(normalize_session_id(" a "), Some("a".to_string()));
        assert_eq!(normalize_session_id(""), None);
        assert_eq!(normalize_session_id("\t"), None);
    }
}
