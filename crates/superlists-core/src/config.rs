use crate::{SuperListsError, SuperListsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global, board-independent settings.
///
/// Stored by the settings panel under the `"settings"` key; field names on the
/// wire are camelCase so the stored object stays readable by the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Character that marks a section card when repeated `section_repeat` times.
    pub section_char: char,
    pub section_repeat: usize,
    /// Paint reached/exceeded WiP state as a bar across the top of the list.
    pub wip_top_bar: bool,
    /// Show a plain card count on lists without a `[N]` limit.
    pub always_count: bool,
    pub combine_lists: bool,
    /// List width in pixels while compact mode is on.
    pub compact_list_width: u32,
    pub remember_view_state: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            section_char: '#',
            section_repeat: 3,
            wip_top_bar: false,
            always_count: false,
            combine_lists: true,
            compact_list_width: 150,
            remember_view_state: true,
        }
    }
}

impl Settings {
    /// The string whose presence in a card title makes the card a section.
    pub fn section_identifier(&self) -> String {
        self.section_char.to_string().repeat(self.section_repeat)
    }

    pub fn validate(&self) -> SuperListsResult<()> {
        if self.section_repeat == 0 {
            return Err(SuperListsError::invalid(
                "sectionRepeat must be at least 1",
            ));
        }
        if self.section_char.is_whitespace() {
            return Err(SuperListsError::invalid(
                "sectionChar must not be whitespace",
            ));
        }
        if self.compact_list_width == 0 {
            return Err(SuperListsError::invalid(
                "compactListWidth must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/superlists/settings.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("superlists/settings.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("superlists\\settings.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Defaults from the user's config file, or built-in defaults when absent.
    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                if let Ok(settings) = Self::load_from(&config_path) {
                    return settings;
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> SuperListsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| SuperListsError::Serialization(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}
