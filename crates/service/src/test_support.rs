#![cfg(test)]
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connection to the test database, or `None` when DB tests are disabled.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    MIGRATED
        .get_or_try_init(|| async {
            let db = models::db::connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // fresh connection for the current test's runtime
    let mut cfg = configs::DatabaseConfig::default();
    cfg.url = std::env::var("DATABASE_URL")?;
    cfg.max_connections = cfg.max_connections.max(20);
    Ok(Some(models::db::connect_with_config(&cfg).await?))
}
