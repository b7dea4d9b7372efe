//! Persisted light/dark theme preference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::store::{LocalStore, StoreError};

/// Theme mode. Defaults to light when nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// Value written to the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Read the stored preference. Unknown values fall back to light.
    pub fn load(store: &LocalStore, key: &str) -> Self {
        store
            .get(key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Persist this mode under `key`.
    pub fn save(self, store: &mut LocalStore, key: &str) -> Result<(), StoreError> {
        store.set(key, self.as_str())?;
        info!(theme = self.as_str(), "Theme preference saved");
        Ok(())
    }

    /// Flip the stored preference and return the new mode.
    pub fn toggle(store: &mut LocalStore, key: &str) -> Result<Self, StoreError> {
        let next = Self::load(store, key).toggled();
        next.save(store, key)?;
        Ok(next)
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised theme names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme '{0}' (expected 'light' or 'dark')")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeMode {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}
