use std::env;
use std::net::{IpAddr, SocketAddr};

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

/// Top-level configuration for the scheduling service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { variable: "APP_PORT" })?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let ansi = environment == AppEnvironment::Development;

        let smtp_port = var_or("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort {
                variable: "SMTP_PORT",
            })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi,
                include_target: false,
            },
            mail: MailConfig {
                smtp_host: var_or("SMTP_HOST", "smtp.gmail.com"),
                smtp_port,
                sender_email: var_or("SMTP_EMAIL", ""),
                sender_password: var_or("SMTP_PASSWORD", ""),
                sender_name: var_or("MAIL_SENDER_NAME", "Ruedas Felices"),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
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
    pub ansi: bool,
    pub include_target: bool,
}

/// Outbound mail settings for appointment confirmations.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub sender_name: String,
}

impl MailConfig {
    /// Returns the sender credentials, or `None` when either half is blank.
    pub fn credentials(&self) -> Option<MailCredentials> {
        if self.sender_email.trim().is_empty() || self.sender_password.is_empty() {
            return None;
        }

        Some(MailCredentials {
            sender_email: self.sender_email.trim().to_string(),
            sender_password: self.sender_password.clone(),
            sender_name: self.sender_name.clone(),
        })
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

/// Sender identity handed to the notification coordinator.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub sender_email: String,
    pub sender_password: String,
    pub sender_name: String,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{variable} must be a valid u16")]
    InvalidPort { variable: &'static str },
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_EMAIL",
            "SMTP_PASSWORD",
            "MAIL_SENDER_NAME",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_port, 587);
        assert!(config.mail.credentials().is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_invalid_smtp_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_PORT", "submission");
        match AppConfig::load() {
            Err(ConfigError::InvalidPort { variable }) => assert_eq!(variable, "SMTP_PORT"),
            other => panic!("expected invalid port, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn credentials_require_address_and_password() {
        let mail = MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            sender_email: "citas@example.com".to_string(),
            sender_password: String::new(),
            sender_name: "Ruedas Felices".to_string(),
        };
        assert!(mail.credentials().is_none());

        let configured = MailConfig {
            sender_password: "app-password".to_string(),
            ..mail
        };
        let credentials = configured.credentials().expect("credentials present");
        assert_eq!(credentials.sender_email, "citas@example.com");
        assert!(!format!("{credentials:?}").contains("app-password"));
    }
}
