//! Configuration management for the Lettermint webhook receiver.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use lettermint_core::{SignatureVerifier, WebhookError};
use lettermint_transport::{TransportConfig, TransportError};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "lettermint.toml";

const ENV_PREFIX: &str = "LETTERMINT_";

const MASK: &str = "***";

/// What the webhook endpoint does with an event string it does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownEventPolicy {
    /// Answer 422 with `UnknownEventType`.
    #[default]
    Reject,
    /// Answer 200 `{"status":"ignored"}` without dispatching.
    Ignore,
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `LETTERMINT_` (highest priority)
/// 2. Configuration file (`lettermint.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```no_run
/// use lettermint_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `LETTERMINT_HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `LETTERMINT_PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `LETTERMINT_REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Largest accepted request body in bytes.
    ///
    /// Environment variable: `LETTERMINT_MAX_BODY_BYTES`
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    // Sending API
    /// API token for the sending API.
    ///
    /// Environment variable: `LETTERMINT_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    /// Route id attached to every outgoing message.
    ///
    /// Environment variable: `LETTERMINT_ROUTE_ID`
    #[serde(default)]
    pub route_id: Option<String>,
    /// Derive idempotency keys for messages without an explicit one.
    ///
    /// Environment variable: `LETTERMINT_IDEMPOTENCY`
    #[serde(default)]
    pub idempotency: bool,
    /// Deduplication window for derived idempotency keys in seconds.
    ///
    /// Environment variable: `LETTERMINT_IDEMPOTENCY_WINDOW`
    #[serde(default = "default_idempotency_window")]
    pub idempotency_window: u64,

    // Webhooks
    /// Shared secret used to sign webhook deliveries.
    ///
    /// Environment variable: `LETTERMINT_WEBHOOK_SECRET`
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Path prefix of the webhook route, `/{prefix}/webhook`.
    ///
    /// Environment variable: `LETTERMINT_WEBHOOK_PREFIX`
    #[serde(default = "default_webhook_prefix")]
    pub webhook_prefix: String,
    /// Allowed skew of the signed timestamp in seconds.
    ///
    /// Environment variable: `LETTERMINT_WEBHOOK_TOLERANCE`
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance: u64,
    /// Handling of unrecognized event strings.
    ///
    /// Environment variable: `LETTERMINT_WEBHOOK_UNKNOWN_EVENTS`
    #[serde(default)]
    pub webhook_unknown_events: UnknownEventPolicy,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Projects the webhook settings.
    pub fn webhook_config(&self) -> WebhookConfig {
        WebhookConfig {
            secret: self.webhook_secret.clone(),
            prefix: self.webhook_prefix.clone(),
            tolerance: Duration::from_secs(self.webhook_tolerance),
            unknown_events: self.webhook_unknown_events,
        }
    }

    /// Projects the sending API settings.
    ///
    /// # Errors
    ///
    /// Returns `ApiTokenNotConfigured` when no token is set.
    pub fn transport_config(&self) -> Result<TransportConfig, TransportError> {
        Ok(TransportConfig::new(self.token.as_deref())?
            .with_route_id(self.route_id.clone())
            .with_idempotency(self.idempotency, Duration::from_secs(self.idempotency_window)))
    }

    /// Copy of the configuration with secrets masked, for logging.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| MASK.to_string()),
            webhook_secret: self.webhook_secret.as_ref().map(|_| MASK.to_string()),
            ..self.clone()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        if self.idempotency_window == 0 {
            anyhow::bail!("idempotency_window must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            token: None,
            route_id: None,
            idempotency: false,
            idempotency_window: default_idempotency_window(),
            webhook_secret: None,
            webhook_prefix: default_webhook_prefix(),
            webhook_tolerance: default_webhook_tolerance(),
            webhook_unknown_events: UnknownEventPolicy::default(),
        }
    }
}

/// Webhook receiver settings injected into the verifier and router.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Shared signing secret.
    pub secret: Option<String>,
    /// Route prefix, without slashes.
    pub prefix: String,
    /// Allowed timestamp skew.
    pub tolerance: Duration,
    /// Handling of unrecognized event strings.
    pub unknown_events: UnknownEventPolicy,
}

impl WebhookConfig {
    /// Settings with the default prefix, tolerance and policy.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            prefix: default_webhook_prefix(),
            tolerance: Duration::from_secs(default_webhook_tolerance()),
            unknown_events: UnknownEventPolicy::default(),
        }
    }

    /// Path of the webhook route.
    ///
    /// Surrounding slashes in the prefix are ignored; an empty prefix mounts
    /// the route at `/webhook`.
    pub fn route_path(&self) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            "/webhook".to_string()
        } else {
            format!("/{prefix}/webhook")
        }
    }

    /// Builds the signature verifier.
    ///
    /// # Errors
    ///
    /// Returns `SecretNotConfigured` when no secret is set.
    pub fn verifier(&self) -> Result<SignatureVerifier, WebhookError> {
        SignatureVerifier::new(self.secret.as_deref(), self.tolerance)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Config::default().webhook_config()
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| MASK))
            .field("prefix", &self.prefix)
            .field("tolerance", &self.tolerance)
            .field("unknown_events", &self.unknown_events)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_idempotency_window() -> u64 {
    86_400
}

fn default_webhook_prefix() -> String {
    "lettermint".to_string()
}

fn default_webhook_tolerance() -> u64 {
    lettermint_core::DEFAULT_TOLERANCE_SECS
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        sync::{Mutex, MutexGuard},
    };

    use super::*;

    /// Serializes tests that touch `LETTERMINT_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets `LETTERMINT_*` variables for one test and restores the previous
    /// values when dropped.
    struct ScopedEnv {
        saved: Vec<(String, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn with(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let saved = vars
                .iter()
                .map(|(key, value)| {
                    let previous = env::var(key).ok();
                    env::set_var(key, value);
                    ((*key).to_string(), previous)
                })
                .collect();
            Self { saved, _lock: lock }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for (key, previous) in self.saved.drain(..).rev() {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }

    #[test]
    fn default_config_snapshot() {
        let config = Config::default();

        assert!(config.validate().is_ok());

        insta::assert_json_snapshot!(config, @r#"
        {
          "host": "127.0.0.1",
          "port": 8080,
          "request_timeout": 30,
          "max_body_bytes": 10485760,
          "token": null,
          "route_id": null,
          "idempotency": false,
          "idempotency_window": 86400,
          "webhook_secret": null,
          "webhook_prefix": "lettermint",
          "webhook_tolerance": 300,
          "webhook_unknown_events": "reject"
        }
        "#);
    }

    #[test]
    fn env_overrides_defaults() {
        let _env = ScopedEnv::with(&[
            ("LETTERMINT_PORT", "9090"),
            ("LETTERMINT_WEBHOOK_SECRET", "whsec_env"),
            ("LETTERMINT_WEBHOOK_PREFIX", "mail"),
            ("LETTERMINT_WEBHOOK_TOLERANCE", "60"),
            ("LETTERMINT_WEBHOOK_UNKNOWN_EVENTS", "ignore"),
            ("LETTERMINT_IDEMPOTENCY", "true"),
        ]);

        let config = Config::load().expect("Config should load with env overrides");

        assert_eq!(config.port, 9090);
        assert_eq!(config.webhook_secret.as_deref(), Some("whsec_env"));
        assert!(config.idempotency);

        let webhook = config.webhook_config();
        assert_eq!(webhook.route_path(), "/mail/webhook");
        assert_eq!(webhook.tolerance, Duration::from_secs(60));
        assert_eq!(webhook.unknown_events, UnknownEventPolicy::Ignore);
        assert!(webhook.verifier().is_ok());
    }

    #[test]
    fn invalid_config_validation_fails() {
        let invalid = [
            Config { port: 0, ..Config::default() },
            Config { request_timeout: 0, ..Config::default() },
            Config { max_body_bytes: 0, ..Config::default() },
            Config { idempotency_window: 0, ..Config::default() },
        ];

        for config in invalid {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn server_addr_parses() {
        let config = Config { host: "0.0.0.0".into(), port: 3000, ..Config::default() };
        assert_eq!(config.parse_server_addr().unwrap().to_string(), "0.0.0.0:3000");

        let config = Config { host: "not an ip".into(), ..Config::default() };
        assert!(config.parse_server_addr().is_err());
    }

    #[test]
    fn missing_secret_fails_verifier_construction() {
        let webhook = Config::default().webhook_config();
        assert_eq!(webhook.verifier().unwrap_err(), WebhookError::SecretNotConfigured);
    }

    #[test]
    fn transport_config_requires_token() {
        let config = Config::default();
        assert!(matches!(config.transport_config(), Err(TransportError::ApiTokenNotConfigured)));

        let config = Config {
            token: Some("lm_token".into()),
            route_id: Some("broadcast".into()),
            idempotency: true,
            idempotency_window: 600,
            ..Config::default()
        };
        let transport = config.transport_config().unwrap();
        assert_eq!(transport.token(), "lm_token");
        assert_eq!(transport.route_id.as_deref(), Some("broadcast"));
        assert!(transport.idempotency);
        assert_eq!(transport.idempotency_window, Duration::from_secs(600));
    }

    #[test]
    fn secrets_are_masked() {
        let config = Config {
            token: Some("lm_token".into()),
            webhook_secret: Some("whsec_secret".into()),
            ..Config::default()
        };

        let redacted = config.redacted();
        assert_eq!(redacted.token.as_deref(), Some("***"));
        assert_eq!(redacted.webhook_secret.as_deref(), Some("***"));
        assert_eq!(redacted.port, config.port);

        let debug = format!("{:?}", config.webhook_config());
        assert!(!debug.contains("whsec_secret"));
    }

    #[test]
    fn route_path_normalizes_prefix() {
        let mut webhook = WebhookConfig::new("secret");
        assert_eq!(webhook.route_path(), "/lettermint/webhook");

        webhook.prefix = "/hooks/mail/".into();
        assert_eq!(webhook.route_path(), "/hooks/mail/webhook");

        webhook.prefix = String::new();
        assert_eq!(webhook.route_path(), "/webhook");
    }
}
