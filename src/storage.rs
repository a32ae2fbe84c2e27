//! Local storage module for saving decks
//!
//! Handles saving a committed deck to the user's Documents folder,
//! or a custom location if configured in preferences.

use crate::capture::SlideSegment;
use crate::preferences;
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Get the deck storage directory
///
/// Returns the custom location from preferences if set,
/// otherwise returns the default location in Documents.
pub fn decks_dir() -> Option<PathBuf> {
    // Check for custom location in preferences first
    if let Some(custom) = preferences::get_deck_location() {
        return Some(custom);
    }
    // Fall back to default location
    preferences::default_deck_location()
}

/// Ensure the deck directory exists
pub fn ensure_decks_dir() -> Result<PathBuf, StorageError> {
    let dir = decks_dir().ok_or(StorageError::NoDocumentsDir)?;

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;
        info!("Created deck directory: {:?}", dir);
    }

    Ok(dir)
}

/// Save a deck to a markdown file
///
/// Returns the path to the saved file
pub fn save_deck(slides: &[SlideSegment]) -> Result<PathBuf, StorageError> {
    if slides.is_empty() {
        return Err(StorageError::EmptyDeck);
    }

    let dir = ensure_decks_dir()?;

    // Generate filename with timestamp
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let filename = format!("deck-{}.md", timestamp);
    let filepath = dir.join(&filename);

    // Write deck to file
    let mut file = fs::File::create(&filepath).map_err(|e| StorageError::CreateFile {
        path: filepath.clone(),
        source: e,
    })?;

    file.write_all(render_deck(slides).as_bytes())
        .map_err(|e| StorageError::WriteFile {
            path: filepath.clone(),
            source: e,
        })?;

    file.flush().map_err(|e| StorageError::WriteFile {
        path: filepath.clone(),
        source: e,
    })?;

    info!("Saved deck to: {:?}", filepath);
    Ok(filepath)
}

/// Render a deck as markdown, one section per slide
fn render_deck(slides: &[SlideSegment]) -> String {
    let mut out = String::new();
    for slide in slides {
        out.push_str(&format!("## Slide {}\n\n{}\n\n", slide.index, slide.text));
    }
    out
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Could not find Documents directory")]
    NoDocumentsDir,

    #[error("Deck is empty")]
    EmptyDeck,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
