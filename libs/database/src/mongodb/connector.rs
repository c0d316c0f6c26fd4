use mongodb::{Client, options::ClientOptions};
use std::time::Duration;
use tracing::{info, instrument};

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryPolicy, retry_with_policy};

/// Build a client from `config` and verify the server answers.
///
/// The driver connects lazily, so a cheap `list_database_names` round trip is
/// issued to surface unreachable servers at startup.
#[instrument(skip(config), fields(database = %config.database))]
pub async fn connect(config: &MongoConfig) -> DatabaseResult<Client> {
    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    options.app_name = config.app_name.clone();

    let client = Client::with_options(options)?;

    client
        .list_database_names()
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Connected to MongoDB");
    Ok(client)
}

/// [`connect`] with exponential backoff; `None` uses [`RetryPolicy::default`].
pub async fn connect_with_retry(
    config: &MongoConfig,
    policy: Option<RetryPolicy>,
) -> DatabaseResult<Client> {
    retry_with_policy(policy.unwrap_or_default(), || connect(config)).await
}
