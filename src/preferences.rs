//! User preferences storage
//!
//! Handles saving and loading user preferences to a JSON file
//! in the application config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Default recognition language when none is configured
const DEFAULT_LANGUAGE_CODE: &str = "en-US";

/// Default presentation API base URL
const DEFAULT_API_URL: &str = "http://localhost:7071";

/// User preferences
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// BCP-47 language tag for recognition (e.g., "en-US")
    /// Defaults to "en-US" if not set
    pub language_code: Option<String>,
    /// Base URL of the presentation-generation API
    pub api_url: Option<String>,
    /// Custom deck storage location (None = use default)
    pub deck_location: Option<PathBuf>,
}

/// Get the preferences file path
fn preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Slidevoice").join("preferences.json"))
}

/// Load preferences from disk
///
/// Returns default preferences if the file doesn't exist or can't be read
pub fn load_preferences() -> Preferences {
    let Some(path) = preferences_path() else {
        return Preferences::default();
    };

    if !path.exists() {
        return Preferences::default();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(prefs) => prefs,
            Err(e) => {
                error!("Failed to parse preferences: {}", e);
                Preferences::default()
            }
        },
        Err(e) => {
            error!("Failed to read preferences file: {}", e);
            Preferences::default()
        }
    }
}

/// Save preferences to disk
pub fn save_preferences(prefs: &Preferences) -> Result<(), PreferencesError> {
    let path = preferences_path().ok_or(PreferencesError::NoConfigDir)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("Created preferences directory: {:?}", parent);
        }
    }

    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(&path, json)?;
    info!("Saved preferences to: {:?}", path);

    Ok(())
}

/// Get the recognition language code
/// Returns "en-US" if not set
pub fn get_language_code() -> String {
    load_preferences()
        .language_code
        .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string())
}

/// Set the recognition language code
pub fn set_language_code(code: &str) -> Result<(), PreferencesError> {
    let mut prefs = load_preferences();
    prefs.language_code = Some(code.to_string());
    save_preferences(&prefs)
}

/// Get the presentation API base URL
pub fn get_api_url() -> String {
    load_preferences()
        .api_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Set the presentation API base URL
pub fn set_api_url(url: &str) -> Result<(), PreferencesError> {
    let mut prefs = load_preferences();
    prefs.api_url = Some(url.to_string());
    save_preferences(&prefs)
}

/// Get the custom deck location, if set
pub fn get_deck_location() -> Option<PathBuf> {
    load_preferences().deck_location
}

/// Set a custom deck location
pub fn set_deck_location(path: Option<PathBuf>) -> Result<(), PreferencesError> {
    let mut prefs = load_preferences();
    prefs.deck_location = path;
    save_preferences(&prefs)
}

/// Get the default deck location path
pub fn default_deck_location() -> Option<PathBuf> {
    dirs::document_dir().map(|d| d.join("Slidevoice").join("decks"))
}

/// Preferences errors
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
