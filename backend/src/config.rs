use serde::Deserialize;

/// Process bootstrap configuration, read once at startup.
///
/// Everything the core can reconfigure at runtime (block messages, poll
/// interval, strict mode, ...) lives in the `settings` table behind the
/// config store, not here - see `services::config_store`. Upstream
/// connection details are the one exception: they size the single
/// `UpstreamClient` constructed at boot (spec §4.1), so they are read once
/// here rather than hot-reloaded; a corresponding row is still seeded into
/// `settings` so the admin UI can display the effective value.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_allowed_origin: Option<String>,

    pub plex_server_ip: String,
    pub plex_server_port: u16,
    pub plex_token: String,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub ignore_ssl_errors: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8787)?
            .set_default("plex_server_ip", "127.0.0.1")?
            .set_default("plex_server_port", 32400)?
            .set_default("plex_token", "")?
            .set_default("use_ssl", false)?
            .set_default("ignore_ssl_errors", false)?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }
}
