use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use lazy_static::lazy_static;
use regex::Regex;

/// Leading integer of `raw`, read the way JavaScript's `parseInt` does:
/// leading whitespace and trailing garbage are ignored, no ASCII digits
/// means `None`.
pub fn parse_id(raw: &str) -> Option<i64> {
    lazy_static! {
        static ref LEADING_INT_RE: Regex = Regex::new(r"^\s*([+-]?[0-9]+)").unwrap();
    }
    LEADING_INT_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// `:id` path segment that never rejects; an unreadable id is `None`
/// and the handler answers with `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LooseId(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for LooseId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable id segment");
                return Ok(LooseId(None));
            }
        };
        let id = parse_id(&raw);
        if id.is_none() {
            tracing::debug!(raw = %raw, "unparseable id");
        }
        Ok(LooseId(id))
    }
}
