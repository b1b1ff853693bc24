use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub generator: GeneratorConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub external_url: Option<String>,
    pub api_rate_limit: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub api_max_limit: u32,
    pub max_request_body_size: usize,
    pub max_pages: u64, // Upper bound reported in total_pages
}

/// Which recipe generator backs the resolver's miss path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    /// Synthesize placeholder recipes locally
    Template,
    /// Ask an external resolver service over HTTP
    Remote,
}

impl FromStr for GeneratorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "template" => Ok(GeneratorMode::Template),
            "remote" => Ok(GeneratorMode::Remote),
            other => Err(Error::Config(format!("Unknown GENERATOR_MODE: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub mode: GeneratorMode,
    pub resolver_url: Option<String>,
    pub timeout_seconds: u64,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2000,
        }
    }
}

/// Read an environment variable, falling back to `default` when unset
fn env_or<T: FromStr>(key: &str, default: &str) -> Result<T> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {key} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/recipebook.db".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let external_url = std::env::var("EXTERNAL_URL").ok();
        let resolver_url = std::env::var("RESOLVER_URL").ok();

        let mode = std::env::var("GENERATOR_MODE")
            .unwrap_or_else(|_| "template".to_string())
            .parse::<GeneratorMode>()?;

        let embedding_enabled = std::env::var("EMBEDDING_ENABLED")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Settings {
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "25")?,
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", "5")?,
                connection_timeout_seconds: env_or("DATABASE_CONNECTION_TIMEOUT", "30")?,
                idle_timeout_seconds: env_or("DATABASE_IDLE_TIMEOUT", "600")?,
            },
            server: ServerConfig {
                host,
                port: env_or("PORT", "8080")?,
                external_url,
                api_rate_limit: env_or("API_RATE_LIMIT", "100")?,
                request_timeout_seconds: env_or("REQUEST_TIMEOUT", "30")?,
            },
            pagination: PaginationConfig {
                default_limit: env_or("DEFAULT_PAGE_SIZE", "10")?,
                api_max_limit: env_or("API_MAX_LIMIT", "100")?,
                max_request_body_size: env_or("MAX_REQUEST_BODY_SIZE", "1048576")?,
                max_pages: env_or("MAX_PAGES", "10000")?,
            },
            generator: GeneratorConfig {
                mode,
                resolver_url,
                timeout_seconds: env_or("GENERATOR_TIMEOUT", "10")?,
            },
            embedding: EmbeddingConfig {
                enabled: embedding_enabled,
                timeout_ms: env_or("EMBEDDING_TIMEOUT_MS", "2000")?,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.api_rate_limit == 0 {
            return Err(Error::Config("API rate limit must be non-zero".to_string()));
        }

        if self.pagination.default_limit == 0 {
            return Err(Error::Config("Default page size must be non-zero".to_string()));
        }

        if self.pagination.api_max_limit < self.pagination.default_limit {
            return Err(Error::Config(
                "API_MAX_LIMIT must be at least DEFAULT_PAGE_SIZE".to_string(),
            ));
        }

        if self.generator.mode == GeneratorMode::Remote && self.generator.resolver_url.is_none() {
            return Err(Error::Config(
                "RESOLVER_URL is required when GENERATOR_MODE=remote".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: DatabaseConfig {
                url: "sqlite:./data/recipebook.db".to_string(),
                max_connections: 25,
                min_connections: 5,
                connection_timeout_seconds: 30,
                idle_timeout_seconds: 600,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                external_url: None,
                api_rate_limit: 100,
                request_timeout_seconds: 30,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                api_max_limit: 100,
                max_request_body_size: 1048576,
                max_pages: 10000,
            },
            generator: GeneratorConfig {
                mode: GeneratorMode::Template,
                resolver_url: None,
                timeout_seconds: 10,
            },
            embedding: EmbeddingConfig::default(),
        }
    }
}
