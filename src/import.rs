use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

use crate::posts::{repo, repo_types::Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// No seed file on disk.
    Skipped,
    Imported(usize),
}

/// `suits.json` -> `suits.imported.json`
pub fn imported_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.imported.{}", ext.to_string_lossy()),
        None => format!("{stem}.imported"),
    };
    path.with_file_name(name)
}

/// Load every post from `path` in one transaction, then rename the file so
/// the next run skips it. Nothing is renamed if any insert fails.
pub async fn import_posts(db: &SqlitePool, path: &Path) -> anyhow::Result<ImportOutcome> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ImportOutcome::Skipped),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let posts: Vec<Post> =
        serde_json::from_slice(&raw).with_context(|| format!("parse {}", path.display()))?;

    let mut tx = db.begin().await.context("begin tx")?;
    for post in &posts {
        repo::insert_post_tx(&mut tx, post).await?;
    }
    tx.commit().await.context("commit tx")?;

    let target = imported_path(path);
    tokio::fs::rename(path, &target)
        .await
        .with_context(|| format!("rename {} to {}", path.display(), target.display()))?;

    info!(count = posts.len(), from = %path.display(), "posts imported");
    Ok(ImportOutcome::Imported(posts.len()))
}
