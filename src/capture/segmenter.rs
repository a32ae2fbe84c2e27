//! Slide segmentation decision logic
//!
//! Pure functions that decide, for each finalized recognition chunk, whether
//! a spoken slide command is present, what residual text to keep after
//! stripping the command, and whether the accumulated pending text should be
//! committed as a slide. Kept free of any recognition-source state so the
//! policy is testable without a live speech session.

/// Spoken phrases that trigger a slide commit.
///
/// Matching is case-insensitive substring matching: "the next slide shows"
/// triggers, "nextslide" without the space does not.
pub const COMMAND_PHRASES: [&str; 2] = ["next slide", "new slide"];

/// Outcome of inspecting one finalized chunk against the pending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDecision {
    /// Whether a slide should be committed.
    pub commit: bool,
    /// Replacement value for the pending accumulated text.
    pub new_pending: String,
    /// Trimmed text of the committed slide, when `commit` is true.
    pub emitted: Option<String>,
}

/// Check whether a chunk contains any slide command phrase.
pub fn contains_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    COMMAND_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Remove every occurrence of either command phrase, case-insensitively.
///
/// Single left-to-right pass: at each position the phrases are tried in
/// order and a match consumes the phrase without re-scanning the text it
/// skipped. Surrounding whitespace is left for the caller to trim.
pub fn strip_commands(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0;

    for (i, ch) in text.char_indices() {
        if i < skip_until {
            continue;
        }
        let matched = COMMAND_PHRASES.iter().find(|phrase| {
            let phrase = phrase.as_bytes();
            bytes.len() - i >= phrase.len() && bytes[i..i + phrase.len()].eq_ignore_ascii_case(phrase)
        });
        if let Some(phrase) = matched {
            // Phrases are ASCII, so the skip always lands on a char boundary
            skip_until = i + phrase.len();
            continue;
        }
        out.push(ch);
    }

    out
}

/// Decide how a finalized chunk changes the pending text.
///
/// With no command present the chunk is accumulated space-separated onto the
/// pending text. With a command present, the residual text (command phrases
/// stripped) is appended first, then the whole pending value is committed if
/// it trims to something non-empty. A command that leaves nothing to commit
/// is a silent skip: no slide is emitted and the pending text is unchanged.
pub fn segment(pending: &str, final_chunk: &str) -> SegmentDecision {
    if !contains_command(final_chunk) {
        let mut accumulated = pending.to_string();
        accumulated.push(' ');
        accumulated.push_str(final_chunk);
        return SegmentDecision {
            commit: false,
            new_pending: accumulated,
            emitted: None,
        };
    }

    let cleaned = strip_commands(final_chunk);
    let cleaned = cleaned.trim();
    let mut accumulated = pending.to_string();
    if !cleaned.is_empty() {
        accumulated.push(' ');
        accumulated.push_str(cleaned);
    }

    let candidate = accumulated.trim();
    if candidate.is_empty() {
        SegmentDecision {
            commit: false,
            new_pending: accumulated.clone(),
            emitted: None,
        }
    } else {
        SegmentDecision {
            commit: true,
            new_pending: String::new(),
            emitted: Some(candidate.to_string()),
        }
    }
}
