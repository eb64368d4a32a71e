//! Runtime settings: built-in defaults, then an optional `seeya.toml`,
//! then `SEEYA_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// sqlx connection string, e.g. `sqlite:seeya.db`
    pub database_url: String,
    /// Seconds an unanswered "which stop?" prompt is kept server-side
    pub pending_ttl_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("seeya").required(false))
            .add_source(Environment::with_prefix("SEEYA").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:seeya.db")?
            .set_default("pending_ttl_secs", 1800)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: Settings = Settings::builder().unwrap().build().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.database_url, "sqlite:seeya.db");
        assert_eq!(settings.pending_ttl_secs, 1800);
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("port", 9090)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.port, 9090);
    }
}
