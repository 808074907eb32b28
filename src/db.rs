use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Open (creating if needed) the SQLite file named by `database_url`.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")
}

/// A single long-lived connection, so the in-memory database survives
/// between queries.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("connect to in-memory database")
}

/// Applies the embedded migrations. Only an "already exists" failure, from
/// tables left behind by an earlier deployment, is logged and skipped; any
/// other failure stops startup.
pub async fn run_migrations(db: &SqlitePool) -> anyhow::Result<()> {
    match sqlx::migrate!("./migrations").run(db).await {
        Ok(()) => {
            tracing::info!("database migrations checked");
            Ok(())
        }
        Err(e) if already_exists(&e) => {
            tracing::warn!(error = %e, "schema already present; continuing");
            Ok(())
        }
        Err(e) => Err(e).context("run database migrations"),
    }
}

fn already_exists(err: &MigrateError) -> bool {
    matches!(err, MigrateError::Execute(_)) && err.to_string().contains("already exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = connect_in_memory().await.expect("pool");
        run_migrations(&db).await.expect("first run");
        run_migrations(&db).await.expect("second run");

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('suit_post', 'vocabulary')",
        )
        .fetch_one(&db)
        .await
        .expect("query");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn connect_creates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fresh.db");
        let url = format!("sqlite://{}", path.display());

        let db = connect(&url).await.expect("connect");
        run_migrations(&db).await.expect("migrate");
        db.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn tables_from_an_earlier_deployment_are_accepted() {
        let db = connect_in_memory().await.expect("pool");
        sqlx::query("CREATE TABLE vocabulary (id INTEGER PRIMARY KEY, original TEXT)")
            .execute(&db)
            .await
            .expect("pre-create");

        run_migrations(&db).await.expect("migrate");
    }

    #[tokio::test]
    async fn edited_migration_stops_startup() {
        let db = connect_in_memory().await.expect("pool");
        run_migrations(&db).await.expect("migrate");
        sqlx::query("UPDATE _sqlx_migrations SET checksum = X'00'")
            .execute(&db)
            .await
            .expect("tamper");

        let err = run_migrations(&db).await.unwrap_err();
        assert!(format!("{err:#}").contains("run database migrations"));
    }

    #[test]
    fn only_already_exists_is_tolerated() {
        let exists = MigrateError::Execute(sqlx::Error::Protocol(
            "table suit_post already exists".into(),
        ));
        assert!(already_exists(&exists));
        assert!(!already_exists(&MigrateError::VersionMissing(1)));
        assert!(!already_exists(&MigrateError::Execute(sqlx::Error::Protocol(
            "database is locked".into(),
        ))));
    }
}
