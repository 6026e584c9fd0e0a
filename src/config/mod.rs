/// Configuration system for medform.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::MedformConfig::default()`]
/// 2. **User global config**: `~/.medform/config.toml`
/// 3. **Project local config**: `.medform.toml` in the current working directory
/// 4. **Environment variables**: `MEDFORM_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the field level: each file is read
/// as a raw TOML table and merged key by key, so a file that only sets
/// `backend.url` leaves every other value from the previous layer intact.
///
/// # Usage
///
/// ```rust,ignore
/// use medform::config;
///
/// let cfg = config::load();
/// let client = PredictClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{BackendConfig, LoggingConfig, MedformConfig, StorageConfig, WebConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved medform configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed files are skipped so a bad config never blocks a
/// prediction.
pub fn load() -> MedformConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().filter_map(|p| load_toml_table(p.as_ref())));
    apply_env_overrides(&mut config);
    config
}

/// Merge raw TOML tables over the built-in defaults.
fn load_layers(layers: impl Iterator<Item = toml::Value>) -> MedformConfig {
    let Ok(mut merged) = toml::Value::try_from(MedformConfig::default()) else {
        return MedformConfig::default();
    };

    for layer in layers {
        let mut candidate = merged.clone();
        merge_tables(&mut candidate, layer);
        // A layer with wrongly typed values is dropped as a whole.
        if candidate.clone().try_into::<MedformConfig>().is_ok() {
            merged = candidate;
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as a raw value. `None` if missing or unparseable.
fn load_toml_table(path: Option<&PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively overlay `overlay` onto `base`, table by table.
fn merge_tables(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_tables(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.medform/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".medform").join("config.toml"))
}

/// Path to the project local config: `.medform.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".medform.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `MEDFORM_BACKEND_URL`: prediction service base URL
/// - `MEDFORM_WEB_ADDR`: listen address for `medform web`
/// - `MEDFORM_STORAGE_PATH`: local storage file
/// - `MEDFORM_LOGGING`: master logging switch (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut MedformConfig) {
    if let Ok(val) = std::env::var("MEDFORM_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.url = val;
    }
    if let Ok(val) = std::env::var("MEDFORM_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("MEDFORM_STORAGE_PATH") {
        config.storage.path = val;
    }
    if let Ok(val) = std::env::var("MEDFORM_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.medform/config.toml`.
///
/// Creates the `~/.medform/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.medform/ directory")?;
    }

    fs::write(&path, MedformConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `backend.url`. The new value takes the type of
/// the value it replaces; keys missing from the file are looked up in the
/// defaults so a sparse file can still be extended.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    let defaults =
        toml::Value::try_from(MedformConfig::default()).context("failed to serialize defaults")?;
    set_toml_value(&mut root, &defaults, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// `schema` decides which keys exist and what type the new value gets.
fn set_toml_value(
    root: &mut toml::Value,
    schema: &toml::Value,
    key: &str,
    raw_value: &str,
) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    let mut schema_node = schema;
    for &part in sections {
        schema_node = schema_node
            .get(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected table above '{part}' in '{key}'"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    let existing = schema_node
        .get(*leaf)
        .with_context(|| format!("config key not found: '{key}'"))?;

    let new_value = match existing {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw_value)),
        toml::Value::Integer(_) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        toml::Value::Float(_) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        toml::Value::Table(_) => anyhow::bail!("'{key}' is a section, not a value"),
        _ => toml::Value::String(raw_value.to_string()),
    };

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table for '{key}'"))?;
    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
