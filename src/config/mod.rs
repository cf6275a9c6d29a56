//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    pub resolution: ResolutionConfig,
    pub logging: LoggingConfig,
}

/// Registry endpoints and HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the npm registry
    pub npm_base_url: String,
    /// Base URL of the PyPI JSON API host
    pub pypi_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// User-Agent header sent with every registry request
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm_base_url: "https://registry.npmjs.org".to_string(),
            pypi_base_url: "https://pypi.org".to_string(),
            request_timeout_seconds: 10,
            user_agent: format!("lockforge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Version-resolution cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for cached registry responses, in seconds
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

/// Dependency resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Maximum registry fetches in flight within one batch
    pub batch_size: usize,
    /// Maximum declared requirements considered per Python package
    pub max_transitive_requirements: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_transitive_requirements: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Registry configuration error: {message}")]
    Registry { message: String },

    #[error("Cache configuration error: {message}")]
    Cache { message: String },

    #[error("Resolution configuration error: {message}")]
    Resolution { message: String },
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::Registry {
                message: "request_timeout_seconds must be greater than zero".to_string(),
            });
        }
        if self.npm_base_url.is_empty() || self.pypi_base_url.is_empty() {
            return Err(ValidationError::Registry {
                message: "registry base URLs must not be empty".to_string(),
            });
        }
        if self.user_agent.is_empty() {
            return Err(ValidationError::Registry {
                message: "user_agent must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_seconds == 0 {
            return Err(ValidationError::Cache {
                message: "ttl_seconds must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for ResolutionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::Resolution {
                message: "batch_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.registry.validate()?;
        self.cache.validate()?;
        self.resolution.validate()?;
        Ok(())
    }
}

/// Error loading configuration from files or environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Config {
    /// Load configuration from layered sources.
    ///
    /// Precedence, lowest to highest: `config/default.*`, the file named by
    /// `LOCKFORGE_ENV` (e.g. `config/production.*`), `config/local.*`, then
    /// environment variables prefixed `LOCKFORGE__` with `__` as separator
    /// (e.g. `LOCKFORGE__CACHE__TTL_SECONDS=600`).
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("LOCKFORGE_ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        let settings = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("LOCKFORGE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
