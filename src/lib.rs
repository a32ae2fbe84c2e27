#![deny(clippy::all)]

//! Voice-to-presentation capture core.
//!
//! Wraps a continuous speech-to-text source behind an injected
//! [`recognition::RecognitionProvider`], accumulates finalized text,
//! detects the spoken commands "next slide" / "new slide", and segments
//! the transcript into an ordered deck of [`capture::SlideSegment`]s.
//! On explicit stop the committed deck can be handed to the remote
//! presentation-generation API via [`generation::PresentationClient`]
//! or saved locally via [`storage::save_deck`].

pub mod capture;
pub mod error;
pub mod generation;
pub mod preferences;
pub mod recognition;
pub mod storage;

pub use capture::{CaptureEngine, CaptureEvent, RecordingSession, RecordingStatus, SlideSegment};
pub use error::GenerationError;
pub use generation::{GeneratedPresentation, GeneratedSlide, PresentationClient};
pub use recognition::{
    RecognitionConfig, RecognitionEvent, RecognitionProvider, RecognitionSource,
};
