use axum_helpers::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_events::{
    EventService, EventStore, GraphqlEventLookup, InMemoryEventStore, MongoEventStore,
};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;

use config::{Config, StoreBackend};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // A missing .env file is fine; the environment may already be populated
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let lookup = GraphqlEventLookup::new(config.lookup.clone())?;
    info!(endpoint = lookup.endpoint(), "Event lookup client ready");

    match (config.store, config.mongodb.clone()) {
        (StoreBackend::Mongodb, Some(mongodb)) => {
            info!("Connecting to MongoDB at {}", mongodb.url());

            // Connect to MongoDB with retry
            let client = database::mongodb::connect_with_retry(&mongodb, None).await?;
            let store = MongoEventStore::new(client.database(mongodb.database()));
            store.create_indexes().await?;

            let health = database::mongodb::check_health_detailed(&client).await;
            info!(
                response_time_ms = health.response_time_ms,
                "Successfully connected to MongoDB database: {}",
                mongodb.database()
            );

            serve(config, store, lookup, async move {
                info!("Shutting down: closing MongoDB connections");
                client.shutdown().await;
                info!("MongoDB connection closed successfully");
            })
            .await
        }
        (StoreBackend::Mongodb, None) => {
            Err(eyre::eyre!("MongoDB store selected without configuration"))
        }
        (StoreBackend::Memory, _) => {
            warn!("Using the in-memory event store; data is lost on restart");
            serve(config, InMemoryEventStore::new(), lookup, async {}).await
        }
    }
}

async fn serve<S, F>(
    config: Config,
    store: S,
    lookup: GraphqlEventLookup,
    cleanup: F,
) -> eyre::Result<()>
where
    S: EventStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let service = EventService::new(store, lookup);

    // Build router with API routes and OpenAPI docs
    let api_routes = api::routes(&service, &config);
    let app = create_router::<openapi::ApiDoc>(api_routes, &config.cors)
        .merge(api::health::router(service))
        .merge(health_router(config.app));

    info!(
        store = %config.store,
        "Starting Events API with graceful shutdown ({:?} timeout)",
        SHUTDOWN_TIMEOUT
    );

    create_production_app(app, &config.server, SHUTDOWN_TIMEOUT, cleanup)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Events API shutdown complete");
    Ok(())
}
