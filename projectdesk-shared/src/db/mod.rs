/// Database layer for ProjectDesk
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool and health ping
/// - `migrations`: embedded migration runner
/// - `seed`: idempotent demo users and clients for local environments
///
/// Models are in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::db::pool::connect;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = connect(&std::env::var("DATABASE_URL")?, 10).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod seed;
