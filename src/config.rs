//! Server configuration loaded from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_FILE: &str = "data/raffles.json";
const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Snapshot file (None = keep raffles in memory only)
    pub data_file: Option<PathBuf>,
    /// Window in which mutations collapse into a single snapshot write
    pub save_debounce: Duration,
    /// Prefix for generated host/viewer links (None = derive from request Host header)
    pub public_base_url: Option<String>,
    /// Directory holding host.html, view.html and assets
    pub static_dir: PathBuf,
    /// Upload request body limit
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            data_file: Some(PathBuf::from(DEFAULT_DATA_FILE)),
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            public_base_url: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or invalid
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ip = env_parse("BIND_ADDR", defaults.bind_addr.ip());
        let port = env_parse("PORT", DEFAULT_PORT);

        // Present-but-empty DATA_FILE disables disk persistence
        let data_file = match std::env::var("DATA_FILE") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v.trim())),
            Err(_) => defaults.data_file,
        };

        let save_debounce =
            Duration::from_millis(env_parse("SAVE_DEBOUNCE_MS", DEFAULT_SAVE_DEBOUNCE_MS));

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let max_body_bytes = env_parse("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES);

        let config = Self {
            bind_addr: SocketAddr::new(ip, port),
            data_file,
            save_debounce,
            public_base_url,
            static_dir,
            max_body_bytes,
        };

        tracing::info!(
            bind_addr = %config.bind_addr,
            data_file = ?config.data_file,
            save_debounce_ms = config.save_debounce.as_millis() as u64,
            public_base_url = ?config.public_base_url,
            "Server config loaded"
        );

        if config.data_file.is_none() {
            tracing::warn!("DATA_FILE is empty - raffles will NOT survive a restart");
        }

        config
    }
}
