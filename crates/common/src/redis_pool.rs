use redis::Client;
use redis::aio::ConnectionManager;

use crate::error::AppResult;

/// Open a reconnecting Redis connection for the checkpoint store.
///
/// Only the address is logged; the URL may carry credentials.
pub async fn create_redis_pool(redis_url: &str) -> AppResult<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let addr = client.get_connection_info().addr.to_string();
    tracing::debug!(addr = %addr, "Connecting to Redis");

    let manager = ConnectionManager::new(client).await?;

    tracing::info!(addr = %addr, "Connected to Redis checkpoint store");
    Ok(manager)
}
