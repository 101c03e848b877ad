// storage/migrations.rs
// Database migration management

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{Pool, Sqlite};

/// Runs SQLx migrations located in the `migrations/` directory.
///
/// Creates the `scan_cache` and `preferences` tables on a fresh database.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), MigrateError> {
    let migrations_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = Migrator::new(migrations_dir.as_path()).await?;
    migrator.run(pool).await?;
    Ok(())
}
