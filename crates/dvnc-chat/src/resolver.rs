//! Reply resolution: local keyword catalog, optionally fronted by a remote
//! chat endpoint.
//!
//! Remote failures of any kind (transport, status, body, timeout) are logged
//! and answered from the catalog, so `resolve` always produces a reply.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use dvnc_core::config::ResolverSettings;
use dvnc_core::types::ResolutionMode;
use reqwest::Url;

use crate::backend::ChatBackend;
use crate::catalog::ResponseCatalog;
use crate::error::{ChatError, RemoteResolutionError};

/// Default upper bound on one remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// ResolverConfig
// =============================================================================

/// Resolution mode plus the endpoint it needs.
///
/// Invariant: `endpoint` is `Some` exactly when `mode` is `Remote`, and is an
/// absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    mode: ResolutionMode,
    endpoint: Option<String>,
}

impl ResolverConfig {
    pub fn local() -> Self {
        Self::default()
    }

    /// Remote resolution against `endpoint`.
    pub fn remote(endpoint: &str) -> Result<Self, ChatError> {
        let url = Url::parse(endpoint.trim())
            .map_err(|e| ChatError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidEndpoint(format!(
                "{}: unsupported scheme '{}'",
                endpoint,
                url.scheme()
            )));
        }
        Ok(Self {
            mode: ResolutionMode::Remote,
            endpoint: Some(url.to_string()),
        })
    }

    /// Build from the `[resolver]` config section.
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self, ChatError> {
        match settings.mode {
            ResolutionMode::Local => Ok(Self::local()),
            ResolutionMode::Remote => match settings.endpoint.as_deref() {
                Some(endpoint) => Self::remote(endpoint),
                None => Err(ChatError::Config(
                    "remote mode requires an endpoint".to_string(),
                )),
            },
        }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

// =============================================================================
// ResponseResolver
// =============================================================================

/// Turns user text into a reply.
pub struct ResponseResolver {
    catalog: ResponseCatalog,
    backend: Option<Arc<dyn ChatBackend>>,
    config: RwLock<ResolverConfig>,
    timeout: Duration,
}

impl ResponseResolver {
    /// A local-mode resolver over `catalog` with no remote backend attached.
    pub fn new(catalog: ResponseCatalog) -> Self {
        Self {
            catalog,
            backend: None,
            config: RwLock::new(ResolverConfig::local()),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Attach the backend used in remote mode.
    pub fn with_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Bound each remote call; on expiry the catalog answers instead.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_config(self, config: ResolverConfig) -> Self {
        self.set_config(config);
        self
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ResolverConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the configuration. Takes effect for the next `resolve` call;
    /// calls already in flight keep the configuration they started with.
    pub fn set_config(&self, config: ResolverConfig) {
        tracing::info!(
            mode = %config.mode(),
            endpoint = config.endpoint().unwrap_or("-"),
            "Resolver configuration updated"
        );
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    /// Switch to remote resolution against `endpoint`.
    pub fn use_endpoint(&self, endpoint: &str) -> Result<(), ChatError> {
        let config = ResolverConfig::remote(endpoint)?;
        self.set_config(config);
        Ok(())
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a reply for `text`. Never fails; remote errors fall back to
    /// the catalog.
    pub async fn resolve(&self, text: &str) -> String {
        let config = self.config();

        if let (ResolutionMode::Remote, Some(endpoint)) = (config.mode(), config.endpoint()) {
            match self.resolve_remote(endpoint, text).await {
                Ok(reply) => return reply,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        endpoint,
                        "Remote resolution failed, falling back to local catalog"
                    );
                }
            }
        }

        self.resolve_local(text)
    }

    fn resolve_local(&self, text: &str) -> String {
        match self.catalog.find_rule(text) {
            Some((index, rule)) => {
                tracing::debug!(rule = index, "Local catalog rule matched");
                rule.reply().to_string()
            }
            None => {
                tracing::debug!("No catalog rule matched, using default reply");
                self.catalog.default_reply().to_string()
            }
        }
    }

    async fn resolve_remote(
        &self,
        endpoint: &str,
        text: &str,
    ) -> Result<String, RemoteResolutionError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            RemoteResolutionError::Network("no remote backend configured".to_string())
        })?;

        let reply = tokio::time::timeout(self.timeout, backend.send(endpoint, text))
            .await
            .map_err(|_| RemoteResolutionError::Timeout(self.timeout))??;

        if reply.is_empty() {
            return Err(RemoteResolutionError::MissingResponse);
        }
        Ok(reply)
    }
}

// =============================================================================
// Tests
// =============================================================================
