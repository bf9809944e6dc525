/// PostgreSQL connection pool
///
/// The server only chooses the URL and the pool size; the remaining pool
/// tuning is fixed here.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::db::pool::{connect, pool_stats};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = connect("postgresql://localhost/projectdesk", 10).await?;
/// println!("{:?}", pool_stats(&pool));
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Connections kept open while idle, capped by the pool size
const MIN_CONNECTIONS: u32 = 1;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Opens a pool and verifies it with [`ping`]
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database can't be reached
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let max_connections = max_connections.max(1);
    info!(max_connections, "Connecting to database");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(MIN_CONNECTIONS.min(max_connections))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .test_before_acquire(true)
        .connect(url)
        .await?;

    ping(&pool).await?;
    Ok(pool)
}

/// Runs `SELECT 1`; used at startup and by `/health`
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if one != 1 {
        return Err(sqlx::Error::Protocol(format!("SELECT 1 returned {}", one)));
    }

    debug!("Database ping ok");
    Ok(())
}

/// Connection counts reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

pub fn pool_stats(pool: &PgPool) -> PoolStats {
    let total = pool.size() as usize;
    let idle = pool.num_idle();

    PoolStats {
        active_connections: total.saturating_sub(idle),
        idle_connections: idle,
        total_connections: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_stats_serialize() {
        let stats = PoolStats {
            active_connections: 1,
            idle_connections: 3,
            total_connections: 4,
        };

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["active_connections"], 1);
        assert_eq!(json["idle_connections"], 3);
        assert_eq!(json["total_connections"], 4);
    }

    #[test]
    fn test_min_connections_within_pool_size() {
        assert!(MIN_CONNECTIONS <= 1);
        assert!(ACQUIRE_TIMEOUT < IDLE_TIMEOUT);
    }
}
