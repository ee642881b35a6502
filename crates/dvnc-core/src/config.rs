use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DvncError, Result};
use crate::types::ResolutionMode;

/// Top-level configuration for the DVNC chat front end.
///
/// Loaded from `~/.dvnc/config.toml` by default. Every section falls back
/// to its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DvncConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default = "default_quick_actions")]
    pub quick_actions: Vec<QuickAction>,
}

impl Default for DvncConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            resolver: ResolverSettings::default(),
            session: SessionConfig::default(),
            presentation: PresentationConfig::default(),
            catalog: CatalogConfig::default(),
            quick_actions: default_quick_actions(),
        }
    }
}

impl DvncConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DvncConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.resolver.mode == ResolutionMode::Remote
            && self
                .resolver
                .endpoint
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
        {
            return Err(DvncError::Config(
                "resolver.endpoint is required when resolver.mode = \"remote\"".to_string(),
            ));
        }
        if self.presentation.reveal_chunk_chars == 0 {
            return Err(DvncError::Config(
                "presentation.reveal_chunk_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Reply resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// `local` answers from the catalog; `remote` asks `endpoint` first.
    pub mode: ResolutionMode,
    /// Remote chat endpoint. Required when `mode` is `remote`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Upper bound on a single remote call before falling back to the catalog.
    pub timeout_ms: u64,
}

impl ResolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::Local,
            endpoint: None,
            timeout_ms: 10_000,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Artificial delay between the user message and resolving the reply.
    pub think_delay_ms: u64,
}

impl SessionConfig {
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: 600,
        }
    }
}

/// Presentation timing. Only the rendering layer reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Delay between two reveal frames of a bot reply.
    pub typing_delay_ms: u64,
    /// Characters revealed per frame.
    pub reveal_chunk_chars: usize,
}

impl PresentationConfig {
    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: 15,
            reveal_chunk_chars: 3,
        }
    }
}

/// Where the keyword catalog comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML catalog file replacing the built-in catalog. `None` uses the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// A canned prompt the user can send with one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    pub label: String,
    pub message: String,
}

impl QuickAction {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

fn default_quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction::new(
            "Systems thinking",
            "Help me approach a complex problem with systems thinking",
        ),
        QuickAction::new("Innovation", "I need a creative idea for my project"),
        QuickAction::new("Say hello", "Hello!"),
        QuickAction::new("About DVNC", "Who are you?"),
    ]
}
