use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Backend, Config, DashboardSettings, DatabaseSettings, ForecastSettings, LoggingSettings,
    SeedSettings,
};

const DEFAULT_FILE: &str = "farmtech";
const ENV_PREFIX: &str = "FARMTECH";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file (`path`, or an
/// optional `farmtech.toml` in the working directory), then `FARMTECH__SECTION__KEY`
/// environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Loads a configuration from TOML text only, without touching the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

/// Cross-field checks. Run by the loaders; call again after overriding fields by hand.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let db = &config.database;
    if db.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    if db.is_in_memory() && db.max_connections != 1 {
        // Every pooled connection to `:memory:` would open its own empty database.
        return Err(ConfigError::ValidationError(
            "an in-memory sqlite database requires database.max_connections = 1".to_string(),
        ));
    }
    if db.backend == Backend::MySql {
        if db.host.trim().is_empty() || db.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.host and database.name are required for the mysql backend".to_string(),
            ));
        }
        if db.port == 0 {
            return Err(ConfigError::ValidationError("database.port cannot be 0".to_string()));
        }
    }
    let horizon_secs = config.forecast.horizon_secs;
    if horizon_secs <= 0 || chrono::TimeDelta::try_seconds(horizon_secs).is_none() {
        return Err(ConfigError::ValidationError(format!(
            "forecast.horizon_secs must be a positive number of seconds, got {}",
            horizon_secs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_file_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.sqlite_path, PathBuf::from("farmtech.db"));
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.forecast.horizon_secs, 3600);
        assert_eq!(config.seed.readings_per_series, 48);
    }

    #[test]
    fn mysql_section_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [database]
            backend = "mysql"
            host = "db"
            port = 3307

            [dashboard]
            bind_addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.backend, Backend::MySql);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "farmtech_user");
        assert_eq!(config.dashboard.bind_addr.port(), 8080);
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = load_config_from_str("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn pooled_memory_database_is_rejected() {
        let err = load_config_from_str("[database]\nsqlite_path = \":memory:\"\nmax_connections = 4")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn horizon_must_be_positive_and_representable() {
        for horizon in ["0", "-60", "9223372036854775807"] {
            let err = load_config_from_str(&format!("[forecast]\nhorizon_secs = {}", horizon))
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{}", horizon);
        }
        let config = load_config_from_str("[forecast]\nhorizon_secs = 7200").unwrap();
        assert_eq!(config.forecast.horizon_secs, 7200);
    }

    #[test]
    fn unknown_backend_fails_to_load() {
        let err = load_config_from_str("[database]\nbackend = \"oracle\"").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
