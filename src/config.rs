use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Balance provider credential. Required: wallet operations cannot
    /// run without it.
    pub balance_api_key: String,
    /// Market feed credential. Required: the catalog jobs cannot run
    /// without it.
    pub market_api_key: String,
    /// Secondary id-map provider credential. Optional: without it the
    /// external-id job is simply not scheduled.
    pub id_map_api_key: Option<String>,
    /// Scam-filtering policy: drop balance rows the provider attaches no
    /// price data to.
    pub exclude_unpriced_tokens: bool,
    /// Interval between catalog sync runs (market, platform map, decimals).
    pub catalog_sync_interval_secs: u64,
    /// Interval between external-id sync runs.
    pub external_id_sync_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let balance_api_key =
            env::var("BALANCE_API_KEY").map_err(|_| "BALANCE_API_KEY must be set")?;
        let market_api_key =
            env::var("MARKET_API_KEY").map_err(|_| "MARKET_API_KEY must be set")?;
        let id_map_api_key = env::var("ID_MAP_API_KEY").ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let exclude_unpriced_tokens = env::var("EXCLUDE_UNPRICED_TOKENS")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        let catalog_sync_interval_secs = env::var("CATALOG_SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()?;
        let external_id_sync_interval_secs = env::var("EXTERNAL_ID_SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?;

        Ok(Config {
            database_url,
            server_host,
            server_port,
            balance_api_key,
            market_api_key,
            id_map_api_key,
            exclude_unpriced_tokens,
            catalog_sync_interval_secs,
            external_id_sync_interval_secs,
        })
    }
}
