//! Recording session state

use super::segmenter;

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingStatus {
    /// Fresh or reset session, no source active
    #[default]
    Idle,
    /// Recognition source is active and producing events
    Recording,
    /// Source has stopped; terminal until `reset()`
    Stopped,
}

/// One committed unit of transcript text, numbered in commit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSegment {
    /// 1-based position in the deck, assigned at commit time
    pub index: usize,
    /// Trimmed, never-empty transcript text
    pub text: String,
}

/// Accumulated capture session data
///
/// Owned by the engine behind a mutex; mutated only by engine calls and
/// recognition events, which the mutex serializes.
#[derive(Debug, Default, Clone)]
pub struct RecordingSession {
    /// Lifecycle state
    pub status: RecordingStatus,
    /// Finalized text not yet committed to a slide
    pub current_text: String,
    /// Provisional hypothesis for the current utterance, replaced on every
    /// result event and never persisted
    pub interim_text: String,
    /// Committed slides in presentation order
    pub committed_slides: Vec<SlideSegment>,
    /// Last classified error message, if any
    pub last_error: Option<String>,
}

impl RecordingSession {
    /// Commit the pending text as a new slide, if it trims to non-empty.
    ///
    /// An empty pending text is a silent skip: nothing is appended and the
    /// index counter is untouched, so skips are invisible to numbering.
    pub fn commit_pending(&mut self) -> Option<SlideSegment> {
        let text = self.current_text.trim();
        if text.is_empty() {
            return None;
        }
        let segment = SlideSegment {
            index: self.committed_slides.len() + 1,
            text: text.to_string(),
        };
        self.committed_slides.push(segment.clone());
        self.current_text.clear();
        self.interim_text.clear();
        Some(segment)
    }

    /// Apply a finalized recognition chunk.
    ///
    /// Runs the segmentation policy against the pending text and commits a
    /// slide when a command phrase triggered one.
    pub(crate) fn apply_final(&mut self, final_text: &str) -> Option<SlideSegment> {
        let decision = segmenter::segment(&self.current_text, final_text);
        self.current_text = decision.new_pending;
        if !decision.commit {
            return None;
        }
        let text = decision.emitted?;
        let segment = SlideSegment {
            index: self.committed_slides.len() + 1,
            text,
        };
        self.committed_slides.push(segment.clone());
        self.interim_text.clear();
        Some(segment)
    }

    /// Trimmed view of the accumulated pending text for live display
    pub fn live_transcript(&self) -> String {
        self.current_text.trim().to_string()
    }

    /// Space-joined text of all committed slides
    pub fn deck_transcript(&self) -> String {
        self.committed_slides
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Clear all fields and return to `Idle`, discarding committed slides
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
