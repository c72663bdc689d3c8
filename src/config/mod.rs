//! Configuration loading for the identity provider registry.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `IDP_REGISTRY_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "IDP_REGISTRY_";

/// Application configuration derived from `IDP_REGISTRY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Zone that must be one side of every mirror pair
    #[serde(default = "default_root_zone_id")]
    pub root_zone_id: String,
    /// Apply pending migrations when the server starts
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    /// Insert the root zone row at startup if it is missing
    #[serde(default = "default_true")]
    pub seed_root_zone: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            root_zone_id: default_root_zone_id(),
            run_migrations: true,
            seed_root_zone: true,
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a JSON representation with database credentials redacted.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if let Ok(mut url) = Url::parse(&config.database_url)
            && url.password().is_some()
            && url.set_password(Some("[REDACTED]")).is_ok()
        {
            config.database_url = url.to_string();
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if !(1..=100).contains(&self.db_max_connections) {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }

        if self.db_acquire_timeout_ms == 0 {
            return Err(ConfigError::InvalidDbAcquireTimeout {
                value: self.db_acquire_timeout_ms,
            });
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if !is_valid_zone_id(&self.root_zone_id) {
            return Err(ConfigError::InvalidRootZoneId {
                value: self.root_zone_id.clone(),
            });
        }

        Ok(())
    }
}

/// Zone ids are short identifiers: ASCII letters, digits, `-`, `_` and `.`.
pub fn is_valid_zone_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 255
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "postgresql://localhost:5432/idp_registry".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_root_zone_id() -> String {
    "uaa".to_string()
}

fn default_true() -> bool {
    true
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("database url is missing; set IDP_REGISTRY_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database max connections must be between 1 and 100, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("database acquire timeout must be positive, got {value}")]
    InvalidDbAcquireTimeout { value: u64 },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("root zone id '{value}' is not a valid zone id")]
    InvalidRootZoneId { value: String },
    #[error("invalid value '{value}' for {key}: expected a number")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid value '{value}' for {key}: expected true or false")]
    InvalidBool { key: &'static str, value: String },
}

/// Loads configuration using layered `.env` files and `IDP_REGISTRY_*` env vars.
///
/// Precedence, lowest first: `.env`, `.env.local`, `.env.{profile}`,
/// `.env.{profile}.local`, then the process environment.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Process environment wins over every file.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let mut take = |key: &str| layered.remove(key).filter(|value| !value.trim().is_empty());

        let profile = take("PROFILE").unwrap_or(profile_hint);
        let api_bind_addr = take("API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take("LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take("LOG_FORMAT")
            .map(|value| value.to_lowercase())
            .unwrap_or_else(default_log_format);
        let database_url = take("DATABASE_URL").unwrap_or_else(default_database_url);
        let db_max_connections = parse_number(take("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS")?
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms =
            parse_number(take("DB_ACQUIRE_TIMEOUT_MS"), "DB_ACQUIRE_TIMEOUT_MS")?
                .unwrap_or_else(default_db_acquire_timeout_ms);
        let root_zone_id = take("ROOT_ZONE_ID")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(default_root_zone_id);
        let run_migrations =
            parse_bool(take("RUN_MIGRATIONS"), "RUN_MIGRATIONS")?.unwrap_or(true);
        let seed_root_zone =
            parse_bool(take("SEED_ROOT_ZONE"), "SEED_ROOT_ZONE")?.unwrap_or(true);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            root_zone_id,
            run_migrations,
            seed_root_zone,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        })
        .transpose()
}

fn parse_bool(value: Option<String>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    value
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value: raw }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.root_zone_id, "uaa");
        config.bind_addr().expect("default bind addr parses");
    }

    #[test]
    fn validate_rejects_out_of_range_pool() {
        let config = AppConfig {
            db_max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDbMaxConnections { value: 0 })
        ));
    }

    #[test]
    fn validate_rejects_bad_root_zone_and_log_format() {
        let config = AppConfig {
            root_zone_id: "has space".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRootZoneId { .. })
        ));

        let config = AppConfig {
            log_format: "xml".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));
    }

    #[test]
    fn redacted_json_hides_database_password() {
        let config = AppConfig {
            database_url: "postgresql://registry:s3cret@db:5432/idp".to_string(),
            ..Default::default()
        };
        let json = config.redacted_json().unwrap();
        assert!(!json.contains("s3cret"));
        assert!(json.contains("REDACTED"));
    }

    #[test]
    fn parses_flags_and_numbers() {
        assert_eq!(parse_bool(Some("Yes".into()), "X").unwrap(), Some(true));
        assert_eq!(parse_bool(Some("0".into()), "X").unwrap(), Some(false));
        assert!(parse_bool(Some("maybe".into()), "X").is_err());
        assert_eq!(parse_number::<u32>(Some(" 25 ".into()), "X").unwrap(), Some(25));
        assert!(parse_number::<u32>(Some("many".into()), "X").is_err());
        assert_eq!(parse_number::<u32>(None, "X").unwrap(), None);
    }

    #[test]
    fn zone_id_charset() {
        assert!(is_valid_zone_id("uaa"));
        assert!(is_valid_zone_id("tenant-a_1.eu"));
        assert!(!is_valid_zone_id(""));
        assert!(!is_valid_zone_id("a/b"));
    }
}
