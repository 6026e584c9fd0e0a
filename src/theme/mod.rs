//! Light/dark theme preference.
//!
//! The preference lives under a single storage key. Reading it never fails
//! from the caller's point of view: an unavailable store, a missing key, or
//! any value other than `"dark"` all mean [`Theme::Light`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::storage::LocalStorage;

/// Storage key holding the theme mode string.
pub const THEME_KEY: &str = "theme";

/// Visual mode of the document root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Interpret a stored value. Only `"dark"` selects dark mode.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => anyhow::bail!("unknown theme '{s}' (expected light or dark)"),
        }
    }
}

/// Keys on the toggle control that act like a click.
pub fn is_toggle_key(key: &str) -> bool {
    matches!(key, " " | "Spacebar" | "Enter")
}

/// Read the persisted theme, falling back to light on any storage error.
pub fn load_preference(storage: &dyn LocalStorage) -> Theme {
    match storage.get_item(THEME_KEY) {
        Ok(value) => Theme::from_stored(value.as_deref()),
        Err(_) => Theme::Light,
    }
}

/// Persist the theme. Returns whether the write succeeded; failures are
/// otherwise ignored.
pub fn persist_preference(storage: &mut dyn LocalStorage, theme: Theme) -> bool {
    storage.set_item(THEME_KEY, theme.as_str()).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
