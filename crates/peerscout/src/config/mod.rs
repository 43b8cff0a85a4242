use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::domain::ManuscriptModel;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub recommendation: RecommendationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir = env::var("PEERSCOUT_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                dir: PathBuf::from(data_dir),
            },
            recommendation: RecommendationConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the CSV snapshot the engine is built from.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub dir: PathBuf,
}

/// Which similarity oracle backs abstract and manuscript similarity lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityBackend {
    Terms,
    None,
}

/// Tunables for candidate discovery, ranking, and the request cache.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub filter_by_subject_area: bool,
    pub similarity_threshold: f64,
    pub max_similar_manuscripts: usize,
    pub early_career_inclusion: bool,
    pub early_career_interleaving: bool,
    pub cache_capacity: usize,
    pub similarity: SimilarityBackend,
    pub manuscript_model: ManuscriptModel,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            filter_by_subject_area: false,
            similarity_threshold: 0.5,
            max_similar_manuscripts: 50,
            early_career_inclusion: true,
            early_career_interleaving: true,
            cache_capacity: 128,
            similarity: SimilarityBackend::Terms,
            manuscript_model: ManuscriptModel::default(),
        }
    }
}

impl RecommendationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let similarity = match env::var("PEERSCOUT_SIMILARITY") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "terms" | "" => SimilarityBackend::Terms,
                "none" | "off" => SimilarityBackend::None,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "PEERSCOUT_SIMILARITY",
                        value,
                    })
                }
            },
            Err(_) => defaults.similarity,
        };

        let similarity_threshold = parse_env(
            "PEERSCOUT_SIMILARITY_THRESHOLD",
            defaults.similarity_threshold,
        )?;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "PEERSCOUT_SIMILARITY_THRESHOLD",
                value: similarity_threshold.to_string(),
            });
        }

        let mut manuscript_model = defaults.manuscript_model;
        if let Some(values) = list_env("PEERSCOUT_VALID_DECISIONS") {
            manuscript_model.valid_decisions = values;
        }
        if let Some(values) = list_env("PEERSCOUT_VALID_MANUSCRIPT_TYPES") {
            manuscript_model.valid_manuscript_types = values;
        }
        if let Some(values) = list_env("PEERSCOUT_PUBLISHED_DECISIONS") {
            manuscript_model.published_decisions = values;
        }
        if let Some(values) = list_env("PEERSCOUT_PUBLISHED_MANUSCRIPT_TYPES") {
            manuscript_model.published_manuscript_types = values;
        }

        Ok(Self {
            filter_by_subject_area: bool_env(
                "PEERSCOUT_FILTER_BY_SUBJECT_AREA",
                defaults.filter_by_subject_area,
            )?,
            similarity_threshold,
            max_similar_manuscripts: parse_env(
                "PEERSCOUT_MAX_SIMILAR_MANUSCRIPTS",
                defaults.max_similar_manuscripts,
            )?,
            early_career_inclusion: bool_env(
                "PEERSCOUT_EARLY_CAREER_INCLUSION",
                defaults.early_career_inclusion,
            )?,
            early_career_interleaving: bool_env(
                "PEERSCOUT_EARLY_CAREER_INTERLEAVING",
                defaults.early_career_interleaving,
            )?,
            cache_capacity: parse_env("PEERSCOUT_CACHE_CAPACITY", defaults.cache_capacity)?,
            similarity,
            manuscript_model,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

fn bool_env(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
        Err(_) => Ok(default),
    }
}

fn list_env(key: &'static str) -> Option<Vec<String>> {
    env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an unsupported value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

/// Serialises tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}
