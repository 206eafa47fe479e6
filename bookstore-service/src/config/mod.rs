use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_DATABASE: &str = "BOOKSTORE";
const DEFAULT_COLLECTION: &str = "books";

#[derive(Debug, Clone)]
pub struct BookstoreConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl BookstoreConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Resolve the service settings from `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = get_var(&lookup, "ENVIRONMENT", "dev")
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let store: StoreBackend = get_var(&lookup, "STORE_BACKEND", "mongodb")
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if environment == Environment::Prod && store == StoreBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STORE_BACKEND=memory is not allowed in production"
            )));
        }

        let allowed_origins = get_var(&lookup, "CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(BookstoreConfig {
            common,
            environment,
            service_name: get_var(&lookup, "SERVICE_NAME", "bookstore-service"),
            log_level: get_var(&lookup, "LOG_LEVEL", "info"),
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
            store,
            mongodb: MongoConfig {
                uri: resolve_mongo_uri(&lookup),
                database: get_var(&lookup, "MONGO_DB", DEFAULT_DATABASE),
                collection: get_var(&lookup, "MONGO_COLLECTION", DEFAULT_COLLECTION),
            },
            cors: CorsConfig { allowed_origins },
        })
    }
}

/// `MONGO_URI` when set, otherwise a URI assembled from the `MONGO_HOST`,
/// `MONGO_PORT`, `MONGO_USER`, `MONGO_PASS` and `MONGO_DB` components.
/// Credentials are only used when both user and password are present.
pub fn resolve_mongo_uri<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(uri) = lookup("MONGO_URI").filter(|v| !v.is_empty()) {
        return uri;
    }

    let host = get_var(lookup, "MONGO_HOST", "localhost");
    let port = get_var(lookup, "MONGO_PORT", "27017");
    let database = get_var(lookup, "MONGO_DB", DEFAULT_DATABASE);
    let user = lookup("MONGO_USER").filter(|v| !v.is_empty());
    let password = lookup("MONGO_PASS").filter(|v| !v.is_empty());

    match (user, password) {
        (Some(user), Some(password)) => format!(
            "mongodb://{}:{}@{}:{}/{}?authSource=admin",
            user, password, host, port, database
        ),
        _ => format!("mongodb://{}:{}/{}", host, port, database),
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_var<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
