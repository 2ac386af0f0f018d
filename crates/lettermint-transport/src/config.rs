//! Transport settings.

use std::{fmt, time::Duration};

use crate::error::{Result, TransportError};

/// Idempotency window matching the API's retention of keys.
pub const DEFAULT_IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(86_400);

/// Settings the transport needs to build send requests.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    token: String,
    /// Route id attached to every send, when set.
    pub route_id: Option<String>,
    /// Derive idempotency keys for messages without an explicit one.
    pub idempotency: bool,
    /// Deduplication window for derived keys.
    pub idempotency_window: Duration,
}

impl TransportConfig {
    /// Creates a configuration from an API token.
    ///
    /// # Errors
    ///
    /// Returns `ApiTokenNotConfigured` when `token` is `None` or blank.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TransportError::ApiTokenNotConfigured)?;

        Ok(Self {
            token: token.to_string(),
            route_id: None,
            idempotency: false,
            idempotency_window: DEFAULT_IDEMPOTENCY_WINDOW,
        })
    }

    /// Sets the route id; blank ids are treated as unset.
    #[must_use]
    pub fn with_route_id(mut self, route_id: Option<String>) -> Self {
        self.route_id = route_id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Enables automatic idempotency keys with the given window.
    #[must_use]
    pub fn with_idempotency(mut self, enabled: bool, window: Duration) -> Self {
        self.idempotency = enabled;
        self.idempotency_window = window;
        self
    }

    /// The API token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("token", &"***")
            .field("route_id", &self.route_id)
            .field("idempotency", &self.idempotency)
            .field("idempotency_window", &self.idempotency_window)
            .finish()
    }
}
