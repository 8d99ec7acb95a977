//! Service configuration.

use std::fmt;
use std::str::FromStr;

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; data is lost on restart.
    Memory,
    /// `RocksDB` under `data_dir` (needs the `rocksdb-backend` feature).
    Rocksdb,
}

impl Default for StorageBackend {
    fn default() -> Self {
        if cfg!(feature = "rocksdb-backend") {
            Self::Rocksdb
        } else {
            Self::Memory
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::Rocksdb),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Rocksdb => f.write_str("rocksdb"),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/rewards").
    pub data_dir: String,

    /// Storage backend (default: `rocksdb` when compiled in, else `memory`).
    pub storage_backend: StorageBackend,

    /// Origin used to build referral links (default: `http://localhost:3000`).
    pub public_origin: String,

    /// Identity provider base URL; JWKS is served under it.
    pub auth_base_url: String,

    /// Expected JWT issuer (defaults to `auth_base_url`).
    pub auth_issuer: String,

    /// Expected JWT audience (default: "rewards").
    pub auth_audience: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let auth_base_url = std::env::var("AUTH_BASE_URL").unwrap_or(defaults.auth_base_url);
        let storage_backend = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to default storage backend");
                defaults.storage_backend
            }),
            Err(_) => defaults.storage_backend,
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            storage_backend,
            public_origin: std::env::var("PUBLIC_ORIGIN").unwrap_or(defaults.public_origin),
            auth_issuer: std::env::var("AUTH_ISSUER").unwrap_or_else(|_| auth_base_url.clone()),
            auth_base_url,
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or(defaults.auth_audience),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/rewards".into(),
            storage_backend: StorageBackend::default(),
            public_origin: "http://localhost:3000".into(),
            auth_base_url: "http://localhost:9000".into(),
            auth_issuer: "http://localhost:9000".into(),
            auth_audience: "rewards".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!("memory".parse(), Ok(StorageBackend::Memory));
        assert_eq!(" RocksDB ".parse(), Ok(StorageBackend::Rocksdb));
        assert!("postgres".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.auth_issuer, config.auth_base_url);
        assert_eq!(config.auth_audience, "rewards");
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }
}
