//! Settings panel: theme preference, password change and logout.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::PasswordChange;
use crate::errors::ConsoleError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Preferences persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub async fn load(path: &Path) -> Self {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Could not read settings {:?}: {}", path, e);
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt settings {:?}: {}", path, e);
            Self::default()
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConsoleError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Flip the theme and persist it.
    pub async fn toggle_theme(&mut self, path: &Path) -> Result<Theme, ConsoleError> {
        self.theme = self.theme.toggled();
        self.save(path).await?;
        tracing::info!("Theme set to {}", self.theme.as_str());
        Ok(self.theme)
    }
}

/// Local checks before a password change goes out.
pub fn password_change(
    current: &str,
    new: &str,
    confirmation: &str,
) -> Result<PasswordChange, ConsoleError> {
    if current.is_empty() {
        return Err(ConsoleError::field(
            "current_password",
            "The current password is required.",
        ));
    }
    if new.is_empty() {
        return Err(ConsoleError::field(
            "new_password",
            "The new password is required.",
        ));
    }
    if new != confirmation {
        return Err(ConsoleError::field(
            "new_password_confirmation",
            "The new password confirmation does not match.",
        ));
    }
    Ok(PasswordChange {
        current_password: current.to_string(),
        new_password: new.to_string(),
        new_password_confirmation: confirmation.to_string(),
    })
}
