use anyhow::Context;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::repo_types::Post;

/// List every post, oldest id first.
pub async fn list_posts(db: &SqlitePool) -> anyhow::Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, name, description, "startTime", "totalPurchaseCount",
               "user", username, owner, image_cover
          FROM suit_post
         ORDER BY id ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list posts")?;
    Ok(rows)
}

pub async fn get_post(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Post>> {
    let row = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, name, description, "startTime", "totalPurchaseCount",
               "user", username, owner, image_cover
          FROM suit_post
         WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get post")?;
    Ok(row)
}

/// Insert one imported post within a transaction.
pub async fn insert_post_tx(tx: &mut Transaction<'_, Sqlite>, post: &Post) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO suit_post (id, name, description, "startTime", "totalPurchaseCount",
                               "user", username, owner, image_cover)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(post.id)
    .bind(&post.name)
    .bind(&post.description)
    .bind(post.start_time)
    .bind(post.total_purchase_count)
    .bind(post.user)
    .bind(&post.username)
    .bind(post.owner)
    .bind(&post.image_cover)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("insert post {}", post.id))?;
    Ok(())
}
