use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error as ThisError;
use url::Url;

/// Environment prefix; nested keys are separated by `__`,
/// e.g. `SALEWALLET_AUTH__ACCESS_SECRET`.
pub const ENV_PREFIX: &str = "SALEWALLET_";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub loglevel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Externally reachable base URL, embedded in confirmation links.
    pub public_url: Url,
    /// Root directory served under `/public`.
    pub upload_dir: PathBuf,
    pub max_picture_bytes: usize,
    /// Interval of the expired verification token sweep. `0` disables it.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_secret: String,
    pub refresh_ttl_secs: u64,
    pub verification_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Log outgoing mail instead of delivering it.
    Log,
    Smtp,
    /// JSON transactional mail API (Brevo-compatible payload).
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub from_email: String,
    pub from_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub http_endpoint: Option<Url>,
    pub http_api_key: String,
    pub max_per_minute: u32,
    /// Upper bound on a single delivery attempt made while registration holds the write lock.
    pub send_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            mail: MailConfig::default(),
            loglevel: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            public_url: Url::parse("http://localhost:5000").expect("static URL is valid"),
            upload_dir: PathBuf::from("public"),
            max_picture_bytes: 5 * 1024 * 1024,
            sweep_interval_secs: 3600,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:salewallet.sqlite".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_secret: String::new(),
            refresh_ttl_secs: 7 * 24 * 60 * 60,
            verification_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::Log,
            from_email: "no-reply@salewallet.local".to_string(),
            from_name: "SaleWallet".to_string(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            http_endpoint: None,
            http_api_key: String::new(),
            max_per_minute: 60,
            send_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load defaults overlaid with `SALEWALLET_*` environment variables, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;
        if auth.access_secret.trim().is_empty() {
            return Err(invalid("auth.access_secret must be set"));
        }
        if auth.refresh_secret.trim().is_empty() {
            return Err(invalid("auth.refresh_secret must be set"));
        }
        if auth.access_secret == auth.refresh_secret {
            return Err(invalid(
                "auth.access_secret and auth.refresh_secret must differ",
            ));
        }
        if auth.access_ttl_secs == 0 || auth.refresh_ttl_secs == 0 {
            return Err(invalid("token lifetimes must be positive"));
        }
        if auth.verification_ttl_secs == 0 {
            return Err(invalid("auth.verification_ttl_secs must be positive"));
        }

        if !matches!(self.server.public_url.scheme(), "http" | "https") {
            return Err(invalid("server.public_url must be an http(s) URL"));
        }
        if self.server.max_picture_bytes == 0 {
            return Err(invalid("server.max_picture_bytes must be positive"));
        }

        let mail = &self.mail;
        if mail.from_email.trim().is_empty() {
            return Err(invalid("mail.from_email must be set"));
        }
        if mail.max_per_minute == 0 {
            return Err(invalid("mail.max_per_minute must be positive"));
        }
        if mail.send_timeout_secs == 0 {
            return Err(invalid("mail.send_timeout_secs must be positive"));
        }
        match mail.transport {
            MailTransport::Log => {}
            MailTransport::Smtp => {
                if mail.smtp_host.is_empty()
                    || mail.smtp_username.is_empty()
                    || mail.smtp_password.is_empty()
                {
                    return Err(invalid(
                        "SMTP transport requires mail.smtp_host, mail.smtp_username and mail.smtp_password",
                    ));
                }
            }
            MailTransport::Http => {
                if mail.http_endpoint.is_none() || mail.http_api_key.is_empty() {
                    return Err(invalid(
                        "HTTP transport requires mail.http_endpoint and mail.http_api_key",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Lifetime of a freshly issued verification token.
    pub fn verification_ttl(&self) -> chrono::Duration {
        let max_secs = chrono::Duration::MAX.num_seconds();
        let secs = i64::try_from(self.auth.verification_ttl_secs).unwrap_or(max_secs);
        chrono::Duration::seconds(secs.min(max_secs))
    }

    pub fn mail_send_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.mail.send_timeout_secs)
    }

    /// Link embedded in the confirmation mail.
    pub fn confirmation_link(&self, user_id: &str, token: &str) -> String {
        format!(
            "{}/api/v1/user/{}/confirm-email?token={}",
            self.server.public_url.as_str().trim_end_matches('/'),
            user_id,
            token
        )
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut cfg = Config::default();
        cfg.auth.access_secret = "access".to_string();
        cfg.auth.refresh_secret = "refresh".to_string();
        cfg
    }

    #[test]
    fn defaults_require_secrets() {
        assert!(matches!(
            Config::default().validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn secrets_must_differ() {
        let mut cfg = valid();
        cfg.auth.refresh_secret = cfg.auth.access_secret.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn smtp_transport_needs_credentials() {
        let mut cfg = valid();
        cfg.mail.transport = MailTransport::Smtp;
        assert!(cfg.validate().is_err());

        cfg.mail.smtp_host = "smtp.example.com".to_string();
        cfg.mail.smtp_username = "user".to_string();
        cfg.mail.smtp_password = "pass".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_send_timeout_is_rejected() {
        let mut cfg = valid();
        cfg.mail.send_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn confirmation_link_ignores_trailing_slash() {
        let mut cfg = valid();
        cfg.server.public_url = Url::parse("https://wallet.example.com/").unwrap();
        assert_eq!(
            cfg.confirmation_link("abc", "tok"),
            "https://wallet.example.com/api/v1/user/abc/confirm-email?token=tok"
        );
    }
}
