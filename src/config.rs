use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub application: ApplicationConfig,
    pub withdrawals: WithdrawalsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// Payment provider credentials and endpoints. One concrete provider
/// backs the whole platform; everything provider-specific lives here.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub secret_key: String,
    pub api_base: String,
    pub currency: String,
    /// Shared secret the provider echoes back in the webhook signature
    /// header.
    pub webhook_hash: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket_name: String,
    pub signed_url_expiration_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Public base URL used to build payment redirect targets.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalsConfig {
    /// Interval between sweeps over stuck pending payout requests.
    pub sweep_interval_seconds: u64,
    /// A pending request younger than this is assumed to still be
    /// in flight on the request path and is skipped by the sweep.
    pub retry_after_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // Build config from config.yml (required) with environment variable overrides
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("FANVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
