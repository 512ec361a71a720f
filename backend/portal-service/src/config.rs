/// Configuration management
///
/// Settings come from the environment (a `.env` file is loaded first when
/// present). Every field except `DATABASE_URL` and `JWT_SECRET_KEY` has a
/// default.
use chrono::Duration;
use crypto_core::{JwtError, JwtKeys};
use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret_key: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: i64,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,
    #[serde(skip)]
    pub smtp: SmtpConfig,
}

/// Outbound mail settings; an empty host disables delivery
#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_mailbox")]
    pub contact_mailbox: String,
    #[serde(default = "default_subject")]
    pub contact_subject: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_access_ttl() -> i64 {
    crypto_core::jwt::ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_ttl() -> i64 {
    crypto_core::jwt::REFRESH_TOKEN_TTL_SECS
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mailbox() -> String {
    "portal@portal.local".to_string()
}

fn default_subject() -> String {
    "Hello".to_string()
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            contact_mailbox: default_mailbox(),
            contact_subject: default_subject(),
        }
    }
}

impl SmtpConfig {
    /// Read `SMTP_*` / `CONTACT_*`; blank credentials count as unset
    pub fn from_env() -> Result<Self, envy::Error> {
        let mut smtp: SmtpConfig = envy::from_env()?;
        smtp.smtp_username = non_blank(smtp.smtp_username);
        smtp.smtp_password = non_blank(smtp.smtp_password);
        Ok(smtp)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret_key", &"[REDACTED]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("static_dir", &self.static_dir)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("contact_mailbox", &self.contact_mailbox)
            .field("contact_subject", &self.contact_subject)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        let mut config: Config = envy::from_env()?;
        config.smtp = SmtpConfig::from_env()?;
        Ok(config)
    }

    /// Signing keys with the configured lifetimes
    pub fn jwt_keys(&self) -> Result<JwtKeys, JwtError> {
        Ok(JwtKeys::from_secret(self.jwt_secret_key.as_bytes())?.with_lifetimes(
            Duration::seconds(self.access_token_ttl_secs),
            Duration::seconds(self.refresh_token_ttl_secs),
        ))
    }

    /// Origins for CORS; `None` means any origin
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "SERVER_PORT",
        "ACCESS_TOKEN_TTL_SECS",
        "REFRESH_TOKEN_TTL_SECS",
        "STATIC_DIR",
        "CORS_ALLOWED_ORIGINS",
        "SMTP_HOST",
        "SMTP_PORT",
        "CONTACT_MAILBOX",
        "SMTP_USERNAME",
        "SMTP_PASSWORD",
    ];

    fn reset() {
        for name in VARS {
            std::env::remove_var(name);
        }
        std::env::set_var("DATABASE_URL", "postgres://localhost/portal_test");
        std::env::set_var("JWT_SECRET_KEY", "config-test-secret-0123456789abcdef");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        reset();
        let config = Config::from_env().unwrap();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.access_token_ttl_secs, 3600);
        assert_eq!(config.refresh_token_ttl_secs, 30 * 24 * 3600);
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.smtp.smtp_port, 587);
        assert!(config.smtp.smtp_host.is_empty());
        assert!(config.allowed_origins().is_none());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        reset();
        std::env::set_var("SERVER_PORT", "8081");
        std::env::set_var("ACCESS_TOKEN_TTL_SECS", "60");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.server_port, 8081);
        assert_eq!(
            config.allowed_origins().unwrap(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(
            config.jwt_keys().unwrap().lifetime(crypto_core::TokenType::Access),
            Duration::seconds(60)
        );

        for name in VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_an_error() {
        reset();
        std::env::remove_var("JWT_SECRET_KEY");
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_short_secret_rejected() {
        reset();
        std::env::set_var("JWT_SECRET_KEY", "short");
        let config = Config::from_env().unwrap();
        assert!(config.jwt_keys().is_err());
    }

    #[test]
    #[serial]
    fn test_debug_redacts_secrets() {
        reset();
        let rendered = format!("{:?}", Config::from_env().unwrap());
        assert!(!rendered.contains("config-test-secret"));
    }

    #[test]
    #[serial]
    fn test_blank_smtp_credentials_are_unset() {
        reset();
        std::env::set_var("SMTP_HOST", "smtp.portal.test");
        std::env::set_var("SMTP_USERNAME", "");
        std::env::set_var("SMTP_PASSWORD", "  ");

        let config = Config::from_env().unwrap();
        assert_eq!(config.smtp.smtp_host, "smtp.portal.test");
        assert!(config.smtp.smtp_username.is_none());
        assert!(config.smtp.smtp_password.is_none());

        std::env::set_var("SMTP_USERNAME", "mailer");
        std::env::set_var("SMTP_PASSWORD", "s3cret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.smtp.smtp_username.as_deref(), Some("mailer"));
        assert_eq!(config.smtp.smtp_password.as_deref(), Some("s3cret"));

        for name in VARS {
            std::env::remove_var(name);
        }
    }
}
