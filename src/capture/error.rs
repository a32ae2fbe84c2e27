//! Error classification for the capture engine
//!
//! Recognition failures never cross the event boundary as `Err` values;
//! they are mapped to user-facing messages stored on the session state.

/// Message set when `start()` is called without recognition capability
pub(crate) const UNSUPPORTED_MESSAGE: &str =
    "Speech recognition is not supported in this environment.";

/// Message set when source construction fails unexpectedly
pub(crate) const START_FAILED_MESSAGE: &str = "Failed to start recording.";

/// Map a recognition error code to a user-facing message
pub(crate) fn classify_error_code(code: &str) -> String {
    match code {
        "not-allowed" => {
            "Microphone access denied. Please allow microphone access in your browser settings."
                .to_string()
        }
        "no-speech" => "No speech detected. Please try again.".to_string(),
        other => format!("Speech recognition error: {}", other),
    }
}
