use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::auth::sha256_hex;

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_TOKEN_EXPIRY_MINUTES: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub results_dir: PathBuf,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub engine: EngineConfig,
    pub rate_limit_per_minute: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub api_keys: Vec<String>,
    pub jwt_secret: String,
    pub token_expiry: Duration,
    pub admin_username: String,
    pub admin_password_hash: String,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    results: ResultsSection,
    #[serde(default)]
    cache: CacheSection,
    #[serde(default)]
    auth: AuthSection,
    #[serde(default)]
    engine: EngineSection,
    #[serde(default)]
    rate_limit: RateLimitSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsSection {
    #[serde(default = "default_results_dir")]
    dir: PathBuf,
}

impl Default for ResultsSection {
    fn default() -> Self {
        Self {
            dir: default_results_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CacheSection {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_cache_dir")]
    dir: PathBuf,
    #[serde(default = "default_cache_ttl_secs")]
    ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    #[serde(default)]
    api_keys: Vec<String>,
    #[serde(default = "default_jwt_secret")]
    jwt_secret: String,
    #[serde(default = "default_token_expiry_minutes")]
    token_expiry_minutes: u64,
    #[serde(default = "default_admin_username")]
    admin_username: String,
    #[serde(default)]
    admin_password: Option<String>,
    #[serde(default)]
    admin_password_sha256: Option<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            jwt_secret: default_jwt_secret(),
            token_expiry_minutes: default_token_expiry_minutes(),
            admin_username: default_admin_username(),
            admin_password: None,
            admin_password_sha256: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EngineSection {
    #[serde(default = "default_engine_url")]
    base_url: String,
    #[serde(default)]
    api_key: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RateLimitSection {
    #[serde(default)]
    requests_per_minute: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_true() -> bool {
    true
}

fn default_jwt_secret() -> String {
    "default-insecure-secret-change-this".to_string()
}

fn default_token_expiry_minutes() -> u64 {
    DEFAULT_TOKEN_EXPIRY_MINUTES
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "adminpassword".to_string()
}

fn default_engine_url() -> String {
    "http://127.0.0.1:8100".to_string()
}

impl ServerConfig {
    /// Load from `researchd.toml` (or `RESEARCHD_CONFIG`) when present,
    /// otherwise from environment variables.
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_sections(file_config));
        }

        Ok(Self::from_env())
    }

    fn from_sections(file: FileConfig) -> Self {
        Self {
            host: file.server.host,
            port: file.server.port,
            results_dir: file.results.dir,
            cache: CacheConfig {
                enabled: file.cache.enabled,
                dir: file.cache.dir,
                ttl: Duration::from_secs(file.cache.ttl_secs),
            },
            auth: AuthConfig {
                api_keys: file.auth.api_keys,
                jwt_secret: file.auth.jwt_secret,
                token_expiry: Duration::from_secs(file.auth.token_expiry_minutes * 60),
                admin_username: file.auth.admin_username,
                admin_password_hash: resolve_password_hash(
                    file.auth.admin_password_sha256,
                    file.auth.admin_password,
                ),
            },
            engine: EngineConfig {
                base_url: file.engine.base_url,
                api_key: file.engine.api_key,
            },
            rate_limit_per_minute: file.rate_limit.requests_per_minute,
        }
    }

    fn from_env() -> Self {
        let host = env::var("RESEARCHD_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("RESEARCHD_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let results_dir = env::var("RESEARCHD_RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_results_dir());

        let cache_enabled = env::var("RESEARCHD_CACHE_ENABLED")
            .map(|value| value.to_lowercase() == "true")
            .unwrap_or(true);
        let cache_dir = env::var("RESEARCHD_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cache_dir());
        let cache_ttl_secs = match env::var("RESEARCHD_CACHE_TTL").ok() {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!(value = raw, "invalid RESEARCHD_CACHE_TTL, using default");
                DEFAULT_CACHE_TTL_SECS
            }),
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let api_keys = env::var("RESEARCHD_API_KEYS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let jwt_secret = env::var("RESEARCHD_JWT_SECRET").unwrap_or_else(|_| default_jwt_secret());
        let token_expiry_minutes = env::var("RESEARCHD_TOKEN_EXPIRY_MINUTES")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY_MINUTES);
        let admin_username =
            env::var("RESEARCHD_ADMIN_USERNAME").unwrap_or_else(|_| default_admin_username());
        let admin_password_hash = resolve_password_hash(
            env::var("RESEARCHD_ADMIN_PASSWORD_SHA256").ok(),
            env::var("RESEARCHD_ADMIN_PASSWORD").ok(),
        );

        let engine_base_url =
            env::var("RESEARCHD_ENGINE_URL").unwrap_or_else(|_| default_engine_url());
        let engine_api_key = env::var("RESEARCHD_ENGINE_API_KEY").ok();

        let rate_limit_per_minute = env::var("RESEARCHD_RATE_LIMIT_RPM")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());

        Self {
            host,
            port,
            results_dir,
            cache: CacheConfig {
                enabled: cache_enabled,
                dir: cache_dir,
                ttl: Duration::from_secs(cache_ttl_secs),
            },
            auth: AuthConfig {
                api_keys,
                jwt_secret,
                token_expiry: Duration::from_secs(token_expiry_minutes * 60),
                admin_username,
                admin_password_hash,
            },
            engine: EngineConfig {
                base_url: engine_base_url,
                api_key: engine_api_key,
            },
            rate_limit_per_minute,
        }
    }
}

fn resolve_password_hash(hash: Option<String>, password: Option<String>) -> String {
    if let Some(hash) = hash.filter(|value| !value.trim().is_empty()) {
        return hash.trim().to_lowercase();
    }

    let password = password.unwrap_or_else(|| {
        warn!("using default admin password, set an admin password hash for production");
        default_admin_password()
    });
    sha256_hex(&password)
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("RESEARCHD_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("researchd.toml").exists() {
        Some("researchd.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}
