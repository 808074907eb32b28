use anyhow::Context;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::repo_types::{NewVocabulary, Vocabulary};

const COLUMNS: &str = "id, original, translation, phonetic, tags, level, created_at, updated_at";

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Escape LIKE wildcards so the keyword only ever matches literally.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// All rows, or only those whose `original` contains `keyword`
/// (ASCII case-insensitive, as SQLite's LIKE). An empty keyword lists everything.
pub async fn list_vocabulary(
    db: &SqlitePool,
    keyword: Option<&str>,
) -> anyhow::Result<Vec<Vocabulary>> {
    let rows = match keyword.filter(|k| !k.is_empty()) {
        Some(keyword) => sqlx::query_as::<_, Vocabulary>(&format!(
            r#"SELECT {COLUMNS} FROM vocabulary
               WHERE original LIKE ?1 ESCAPE '\'
               ORDER BY id ASC"#
        ))
        .bind(like_pattern(keyword))
        .fetch_all(db)
        .await
        .context("search vocabulary")?,
        None => sqlx::query_as::<_, Vocabulary>(&format!(
            "SELECT {COLUMNS} FROM vocabulary ORDER BY id ASC"
        ))
        .fetch_all(db)
        .await
        .context("list vocabulary")?,
    };
    Ok(rows)
}

pub async fn get_vocabulary(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Vocabulary>> {
    let row = sqlx::query_as::<_, Vocabulary>(&format!(
        "SELECT {COLUMNS} FROM vocabulary WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get vocabulary")?;
    Ok(row)
}

/// Insert and return the stored row. Timestamps default to now.
pub async fn create_vocabulary(db: &SqlitePool, record: &NewVocabulary) -> anyhow::Result<Vocabulary> {
    let now = now_unix();
    let row = sqlx::query_as::<_, Vocabulary>(&format!(
        r#"INSERT INTO vocabulary (original, translation, phonetic, tags, level, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           RETURNING {COLUMNS}"#
    ))
    .bind(&record.original)
    .bind(&record.translation)
    .bind(&record.phonetic)
    .bind(&record.tags)
    .bind(record.level)
    .bind(record.created_at.unwrap_or(now))
    .bind(record.updated_at.unwrap_or(now))
    .fetch_one(db)
    .await
    .context("insert vocabulary")?;
    Ok(row)
}

/// Full replace: optional columns missing from `record` become NULL.
/// `created_at` survives unless `record` carries one; `updated_at` defaults to now.
pub async fn update_vocabulary(
    db: &SqlitePool,
    id: i64,
    record: &NewVocabulary,
) -> anyhow::Result<Option<Vocabulary>> {
    let row = sqlx::query_as::<_, Vocabulary>(&format!(
        r#"UPDATE vocabulary
              SET original = ?2,
                  translation = ?3,
                  phonetic = ?4,
                  tags = ?5,
                  level = ?6,
                  created_at = COALESCE(?7, created_at),
                  updated_at = ?8
            WHERE id = ?1
        RETURNING {COLUMNS}"#
    ))
    .bind(id)
    .bind(&record.original)
    .bind(&record.translation)
    .bind(&record.phonetic)
    .bind(&record.tags)
    .bind(record.level)
    .bind(record.created_at)
    .bind(record.updated_at.unwrap_or_else(now_unix))
    .fetch_optional(db)
    .await
    .context("update vocabulary")?;
    Ok(row)
}

/// Delete and return the removed row.
pub async fn delete_vocabulary(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Vocabulary>> {
    let row = sqlx::query_as::<_, Vocabulary>(&format!(
        "DELETE FROM vocabulary WHERE id = ?1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("delete vocabulary")?;
    Ok(row)
}
