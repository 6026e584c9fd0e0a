/// Configuration schema and defaults for medform.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[backend]`, `[web]`, `[storage]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level medform configuration.
///
/// Maps directly to the `~/.medform/config.toml` and `.medform.toml` file
/// schemas. All sections and fields are optional; missing values fall back
/// to the previous layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedformConfig {
    pub backend: BackendConfig,
    pub web: WebConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Prediction backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the prediction service; `/predict/{model}` is appended.
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded web page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `medform web`.
    pub addr: String,
    /// Open the page in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Client-local storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file path. Empty means `~/.medform/storage.json`.
    pub path: String,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch for all file logging.
    pub enabled: bool,
    /// Append each settled prediction to `~/.medform/predictions.jsonl`.
    pub prediction_log: bool,
    /// Append diagnostics to `~/.medform/medform.log`.
    pub diagnostic_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prediction_log: true,
            diagnostic_log: true,
        }
    }
}

impl LoggingConfig {
    pub fn predictions_enabled(&self) -> bool {
        self.enabled && self.prediction_log
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.enabled && self.diagnostic_log
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl MedformConfig {
    /// The annotated default config written by `medform config init`.
    pub fn default_toml() -> String {
        r#"# medform Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (MEDFORM_*)
#   2. Project config (.medform.toml in current directory)
#   3. User global config (~/.medform/config.toml)
#   4. Built-in defaults

[backend]
url = "http://127.0.0.1:5000"   # POST {url}/predict/{model}

[web]
addr = "127.0.0.1:9747"
open_browser = true

[storage]
path = ""                       # empty = ~/.medform/storage.json

[logging]
enabled = true
prediction_log = true           # ~/.medform/predictions.jsonl
diagnostic_log = true           # ~/.medform/medform.log
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
