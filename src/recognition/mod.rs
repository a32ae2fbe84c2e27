//! Recognition source abstraction
//!
//! The platform speech-to-text capability is injected as a provider rather
//! than probed from global state, so the engine can be exercised against a
//! scripted fake in tests. A constructed source delivers its asynchronous
//! event stream (results, errors, end-of-stream) over an unbounded channel
//! that the capture engine drains on a spawned task.

use tokio::sync::mpsc;

/// Default capture language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Configuration applied to a recognition source before it is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Keep recognizing across utterance boundaries
    pub continuous: bool,
    /// Deliver provisional hypotheses in addition to finalized text
    pub interim_results: bool,
    /// BCP-47 language tag, e.g. "en-US"
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl RecognitionConfig {
    /// Build a config using the language code from user preferences
    pub fn from_preferences() -> Self {
        Self {
            language: crate::preferences::get_language_code(),
            ..Self::default()
        }
    }
}

/// One recognition alternative for a result
#[derive(Debug, Clone, Default)]
pub struct RecognitionAlternative {
    /// Recognized text for this alternative
    pub transcript: String,
}

/// One result in a batch, either finalized or still provisional
#[derive(Debug, Clone, Default)]
pub struct RecognitionResult {
    /// True once the source will not revise this result further
    pub is_final: bool,
    /// Alternatives ordered best-first; the engine reads only the top one
    pub alternatives: Vec<RecognitionAlternative>,
}

impl RecognitionResult {
    /// Build a result with a single alternative
    pub fn new(is_final: bool, transcript: impl Into<String>) -> Self {
        Self {
            is_final,
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
            }],
        }
    }

    /// Top-alternative transcript, or empty if the source sent none
    pub fn transcript(&self) -> &str {
        self.alternatives
            .first()
            .map(|a| a.transcript.as_str())
            .unwrap_or("")
    }
}

/// A batch of results from `result_index` to the end of the known result set
#[derive(Debug, Clone, Default)]
pub struct ResultEvent {
    /// Index of the first result in this batch within the source's result set
    pub result_index: usize,
    /// Results from `result_index` onward
    pub results: Vec<RecognitionResult>,
}

/// Events a recognition source delivers to the engine
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// A batch of finalized and/or provisional results
    Result(ResultEvent),
    /// The source reported an error; `code` is the raw platform code
    Error { code: String },
    /// The source stopped producing results, explicitly or on its own
    End,
}

/// Sending half of a source's event stream
pub type RecognitionEventSender = mpsc::UnboundedSender<RecognitionEvent>;

/// Receiving half drained by the capture engine
pub type RecognitionEventReceiver = mpsc::UnboundedReceiver<RecognitionEvent>;

/// Errors constructing a recognition source
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Recognition capability is not available")]
    Unavailable,

    #[error("Failed to construct recognition source: {0}")]
    Construction(String),
}

/// Injected capability for probing and constructing recognition sources
///
/// `is_available()` is probed once at engine construction; a provider that
/// reports false will never be asked to `create()`.
pub trait RecognitionProvider: Send + Sync {
    /// Whether the platform speech capability exists at all
    fn is_available(&self) -> bool;

    /// Construct a configured source together with its event stream
    fn create(
        &self,
        config: &RecognitionConfig,
    ) -> Result<(Box<dyn RecognitionSource>, RecognitionEventReceiver), ProviderError>;
}

/// Handle to a single live recognition source
///
/// A source is single-use: once stopped it must be discarded and a fresh
/// one constructed for the next capture attempt.
pub trait RecognitionSource: Send {
    /// Begin producing events
    fn start(&mut self);

    /// Ask the source to stop; it signals `RecognitionEvent::End` when done
    fn stop(&mut self);
}
