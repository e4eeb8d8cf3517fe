//! User settings
//!
//! [`StoredSettings`] is the shape kept in the extension's key-value store,
//! every key optional. [`Settings`] is the controller's in-memory copy with
//! defaults applied. Toggles only change the in-memory copy.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Settings as persisted by the key-value store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub auto_translate: Option<bool>,
    #[serde(rename = "showTLDR", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub show_tldr: Option<bool>,
    #[serde(rename = "showELI5", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub show_eli5: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub api_key: Option<String>,
}

impl StoredSettings {
    /// Values written on first install.
    pub fn install_defaults() -> Self {
        let defaults = Settings::default();
        Self {
            auto_translate: Some(defaults.auto_translate),
            show_tldr: Some(defaults.show_tldr),
            show_eli5: Some(defaults.show_eli5),
            dark_mode: Some(defaults.dark_mode),
            api_key: None,
        }
    }

    /// Keys requested from the store on load.
    pub const KEYS: [&'static str; 5] = ["autoTranslate", "showTLDR", "showELI5", "darkMode", "apiKey"];

    /// The configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// In-memory settings held by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub auto_translate: bool,
    pub show_tldr: bool,
    pub show_eli5: bool,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_translate: true,
            show_tldr: true,
            show_eli5: false,
            dark_mode: false,
        }
    }
}

impl Settings {
    /// Apply defaults to every missing key.
    pub fn from_stored(stored: &StoredSettings) -> Self {
        let defaults = Self::default();
        Self {
            auto_translate: stored.auto_translate.unwrap_or(defaults.auto_translate),
            show_tldr: stored.show_tldr.unwrap_or(defaults.show_tldr),
            show_eli5: stored.show_eli5.unwrap_or(defaults.show_eli5),
            dark_mode: stored.dark_mode.unwrap_or(defaults.dark_mode),
        }
    }

    pub fn get(&self, name: SettingName) -> bool {
        match name {
            SettingName::AutoTranslate => self.auto_translate,
            SettingName::ShowTldr => self.show_tldr,
            SettingName::ShowEli5 => self.show_eli5,
        }
    }

    /// Flip one boolean, returning the new value.
    pub fn toggle(&mut self, name: SettingName) -> bool {
        let slot = match name {
            SettingName::AutoTranslate => &mut self.auto_translate,
            SettingName::ShowTldr => &mut self.show_tldr,
            SettingName::ShowEli5 => &mut self.show_eli5,
        };
        *slot = !*slot;
        *slot
    }
}

/// Toggleable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingName {
    AutoTranslate,
    ShowTldr,
    ShowEli5,
}

impl SettingName {
    pub const ALL: [SettingName; 3] = [Self::AutoTranslate, Self::ShowTldr, Self::ShowEli5];

    /// Toolbar button that mirrors this setting's active state.
    pub fn toolbar_button_id(self) -> &'static str {
        match self {
            Self::AutoTranslate => "tdlrr-translate-btn",
            Self::ShowTldr => "tdlrr-tldr-btn",
            Self::ShowEli5 => "tdlrr-eli5-btn",
        }
    }
}
