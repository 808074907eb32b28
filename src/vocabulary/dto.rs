use axum::extract::rejection::JsonRejection;
use thiserror::Error;

use super::schema::ValidationError;

/// `?keyword=` list filter. A repeated key keeps its first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeywordQuery {
    pub keyword: Option<String>,
}

impl KeywordQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let keyword = pairs
            .into_iter()
            .find(|(key, _)| key == "keyword")
            .map(|(_, value)| value);
        Self { keyword }
    }
}

/// Why a write body was refused before reaching the store.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unreadable body: {0}")]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
