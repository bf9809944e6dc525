/// Database migration runner
///
/// Migrations live in `projectdesk-shared/migrations/` and are embedded into
/// the binary at compile time, so the server can bring a fresh database up
/// to date on start.
///
/// - `0001`: schema (users, roles, permissions, tokens, clients, projects, tasks)
/// - `0002`: roles, permissions and their grants
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::db::pool::connect;
/// use projectdesk_shared::db::migrations::{run_migrations, get_migration_status};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = connect(&std::env::var("DATABASE_URL")?, 5).await?;
///     run_migrations(&pool).await?;
///
///     let status = get_migration_status(&pool).await?;
///     println!("Applied {} migrations", status.applied_migrations);
///
///     Ok(())
/// }
/// ```

use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Migration status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Number of migrations embedded in this build
    pub known_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,

    /// Whether every embedded migration has been applied
    pub is_up_to_date: bool,
}

impl MigrationStatus {
    fn new(applied_migrations: usize, latest_version: Option<i64>) -> Self {
        let known_migrations = MIGRATOR.migrations.len();
        Self {
            applied_migrations,
            known_migrations,
            latest_version,
            is_up_to_date: applied_migrations >= known_migrations,
        }
    }
}

/// Runs all pending database migrations
///
/// Each migration runs in its own transaction; a failing migration is
/// rolled back and reported.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(known = MIGRATOR.migrations.len(), "Starting database migrations");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus::new(0, None));
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus::new(count as usize, latest_version))
}

/// Creates the database if it doesn't exist
///
/// Used by the server at startup so a fresh local environment only needs a
/// reachable PostgreSQL server.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations() {
        let versions: Vec<i64> = MIGRATOR.migrations.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![20250601000001, 20250601000002]);
    }

    #[test]
    fn test_status_up_to_date() {
        assert!(!MigrationStatus::new(0, None).is_up_to_date);
        assert!(!MigrationStatus::new(1, Some(20250601000001)).is_up_to_date);

        let status = MigrationStatus::new(2, Some(20250601000002));
        assert!(status.is_up_to_date);
        assert_eq!(status.known_migrations, 2);
    }
}
