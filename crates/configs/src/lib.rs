use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
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
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            upload_dir: default_upload_dir(),
            frontend_dir: default_frontend_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            admin_username: None,
            admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingConfig {
    #[serde(default)]
    pub whatsapp_number: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> String { "data".into() }
fn default_upload_dir() -> String { "uploads".into() }
fn default_frontend_dir() -> String { "public".into() }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_token_ttl_hours() -> i64 { 12 }

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
    /// Load `config.toml` (or `CONFIG_PATH`); a missing file falls back to
    /// defaults plus environment variables.
    pub fn load_and_validate() -> Result<Self> {
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
        self.storage.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.booking.normalize_from_env();
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Some(host) = env_nonempty("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = env_nonempty("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
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

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() || self.upload_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir and storage.upload_dir must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("storage.max_upload_bytes must be positive"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Some(secret) = env_nonempty("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.admin_username.is_none() {
            self.admin_username = env_nonempty("ADMIN_USERNAME");
        }
        if self.admin_password.is_none() {
            self.admin_password = env_nonempty("ADMIN_PASSWORD");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        if let Some(pw) = &self.admin_password {
            if pw.len() < 8 {
                return Err(anyhow!("auth.admin_password must be at least 8 characters"));
            }
        }
        Ok(())
    }
}

impl BookingConfig {
    /// Keep digits only so the number can be embedded in a wa.me link.
    pub fn normalize_from_env(&mut self) {
        if self.whatsapp_number.trim().is_empty() {
            if let Some(n) = env_nonempty("WHATSAPP_NUMBER") {
                self.whatsapp_number = n;
            }
        }
        self.whatsapp_number.retain(|c| c.is_ascii_digit());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_section_defaults() -> Result<()> {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [auth]
            jwt_secret = "s3cret"
            "#,
        )?;
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.storage.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert!(!cfg.logging.json);
        Ok(())
    }

    #[test]
    fn missing_auth_section_keeps_token_ttl_default() -> Result<()> {
        let cfg = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\n")?;
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert_eq!(AppConfig::default().auth.token_ttl_hours, 12);
        Ok(())
    }

    // The only test in this crate that sets process env.
    #[test]
    fn defaults_plus_env_secret_validate() -> Result<()> {
        std::env::set_var("JWT_SECRET", "from-env");
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.auth.jwt_secret, "from-env");
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert_eq!(cfg.server.worker_threads, Some(4));
        Ok(())
    }

    #[test]
    fn validate_rejects_short_admin_password() {
        let auth = AuthConfig {
            jwt_secret: "x".into(),
            token_ttl_hours: 1,
            admin_username: Some("owner".into()),
            admin_password: Some("short".into()),
        };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let auth = AuthConfig { token_ttl_hours: 1, ..Default::default() };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn whatsapp_number_keeps_digits_only() {
        let mut b = BookingConfig { whatsapp_number: "+62 812-3456-789".into() };
        b.normalize_from_env();
        assert_eq!(b.whatsapp_number, "628123456789");
    }

    #[test]
    fn storage_rejects_zero_upload_limit() {
        let s = StorageConfig { max_upload_bytes: 0, ..Default::default() };
        assert!(s.validate().is_err());
    }
}
