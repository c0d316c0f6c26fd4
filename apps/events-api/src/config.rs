use axum_helpers::{ApiKeyConfig, CorsOrigins};
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig};
use domain_events::LookupConfig;
use strum::{Display, EnumString};

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Which `EventStore` backs the API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Mongodb,
    /// Process-local, for development without a database
    Memory,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreBackend,
    /// Present when `store` is [`StoreBackend::Mongodb`]
    pub mongodb: Option<MongoConfig>,
    pub lookup: LookupConfig,
    pub api_key: ApiKeyConfig,
    pub cors: CorsOrigins,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;

        let store = env_or_default("EVENT_STORE", "mongodb")
            .parse::<StoreBackend>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "EVENT_STORE".to_string(),
                details: "expected 'mongodb' or 'memory'".to_string(),
            })?;

        let mongodb = match store {
            StoreBackend::Mongodb => {
                let mut mongodb = MongoConfig::from_env()?;
                if mongodb.app_name.is_none() {
                    mongodb = mongodb.with_app_name(app.name);
                }
                Some(mongodb)
            }
            StoreBackend::Memory => None,
        };

        let cors = CorsOrigins::parse(&env_or_default("CORS_ALLOWED_ORIGIN", "*")).map_err(
            |details| ConfigError::InvalidValue {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details,
            },
        )?;

        Ok(Self {
            app,
            server,
            environment,
            store,
            mongodb,
            lookup: LookupConfig::from_env()?,
            api_key: ApiKeyConfig::from_env()?,
            cors,
        })
    }
}
