use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub odata: ODataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Created with the `admin` role at startup when no user has that email yet.
    #[serde(default)]
    pub bootstrap_admin_email: Option<String>,
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

fn default_jwt_secret() -> String { DEV_JWT_SECRET.to_string() }
fn default_token_ttl_hours() -> i64 { 12 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: default_cache_ttl(), max_entries: default_cache_entries() }
    }
}

fn default_true() -> bool { true }
fn default_cache_ttl() -> u64 { 60 }
fn default_cache_entries() -> u64 { 10_000 }

/// Budgets for the OData-style list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ODataConfig {
    #[serde(default = "default_top")]
    pub default_top: u64,
    #[serde(default = "default_max_top")]
    pub max_top: u64,
    #[serde(default = "default_max_filter_len")]
    pub max_filter_len: usize,
    #[serde(default = "default_max_filter_nodes")]
    pub max_filter_nodes: usize,
    #[serde(default = "default_max_orderby_keys")]
    pub max_orderby_keys: usize,
}

impl Default for ODataConfig {
    fn default() -> Self {
        Self {
            default_top: default_top(),
            max_top: default_max_top(),
            max_filter_len: default_max_filter_len(),
            max_filter_nodes: default_max_filter_nodes(),
            max_orderby_keys: default_max_orderby_keys(),
        }
    }
}

fn default_top() -> u64 { 20 }
fn default_max_top() -> u64 { 100 }
fn default_max_filter_len() -> usize { 2000 }
fn default_max_filter_nodes() -> usize { 100 }
fn default_max_orderby_keys() -> usize { 5 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file falls
    /// back to defaults plus environment variables.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.odata.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.port = port.trim().parse().map_err(|_| anyhow!("SERVER_PORT must be a port number"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret != DEV_JWT_SECRET && self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret must be at least 16 bytes"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        if self.bootstrap_admin_email.is_some() != self.bootstrap_admin_password.is_some() {
            return Err(anyhow!("auth.bootstrap_admin_email and bootstrap_admin_password go together"));
        }
        Ok(())
    }
}

impl ODataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_top == 0 {
            return Err(anyhow!("odata.max_top must be >= 1"));
        }
        if self.default_top == 0 || self.default_top > self.max_top {
            return Err(anyhow!("odata.default_top must be within 1..=max_top"));
        }
        if self.max_filter_len == 0 || self.max_filter_nodes == 0 || self.max_orderby_keys == 0 {
            return Err(anyhow!("odata limits must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.odata.default_top, 20);
        assert_eq!(cfg.odata.max_top, 100);
        assert_eq!(cfg.cache.ttl_secs, 60);
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [cache]
            enabled = false
            ttl_secs = 5

            [odata]
            default_top = 10
            max_top = 50
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9000);
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl_secs, 5);
        assert_eq!(cfg.cache.max_entries, 10_000);
        assert_eq!(cfg.odata.default_top, 10);
        assert_eq!(cfg.odata.max_filter_nodes, 100);
    }

    #[test]
    fn database_validation_rejects_non_postgres_urls() {
        let db = DatabaseConfig { url: "mysql://localhost/db".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://localhost/db".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_ok());
        let db = DatabaseConfig { url: "postgres://localhost/db".into(), min_connections: 5, max_connections: 2, ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn odata_validation_checks_top_bounds() {
        let bad = ODataConfig { default_top: 200, ..ODataConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ODataConfig { max_top: 0, ..ODataConfig::default() };
        assert!(bad.validate().is_err());
        assert!(ODataConfig::default().validate().is_ok());
    }

    #[test]
    fn auth_validation_pairs_bootstrap_fields() {
        let mut auth = AuthConfig::default();
        auth.bootstrap_admin_email = Some("root@example.com".into());
        assert!(auth.validate().is_err());
        auth.bootstrap_admin_password = Some("Sup3rSecret".into());
        assert!(auth.validate().is_ok());
        auth.jwt_secret = "short".into();
        assert!(auth.validate().is_err());
    }
}
