use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored vocabulary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vocabulary {
    pub id: i64,
    pub original: String,
    pub translation: String,
    pub phonetic: Option<String>,
    pub tags: Option<String>, // comma-joined tag list
    pub level: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    /// Client-side note; never stored or sent by the server.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// A validated write payload: every mutable column of a vocabulary row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVocabulary {
    pub original: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl NewVocabulary {
    pub fn new(original: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translation: translation.into(),
            ..Self::default()
        }
    }
}
