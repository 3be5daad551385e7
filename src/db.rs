use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

// Request handlers hold a connection only for the duration of a query, and
// upload traffic is light; a small pool keeps the Postgres footprint down.
pub const DEFAULT_MAX_POOL_SIZE: u32 = 5;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    init_pool_with_size(database_url, DEFAULT_MAX_POOL_SIZE)
}

pub fn init_pool_with_size(database_url: &str, max_size: u32) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(CONNECT_TIMEOUT)
        .build(manager)?;
    Ok(pool)
}
