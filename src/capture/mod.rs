//! Voice capture module for slide-by-slide dictation
//!
//! Owns the lifecycle of a single continuous recognition source and folds
//! its event stream into the recording session: finalized text accumulates,
//! interim hypotheses replace each other, and spoken commands ("next slide",
//! "new slide") commit the accumulated text as numbered slide segments.
//!
//! Session state is shared via `Arc<Mutex<RecordingSession>>`; the mutex
//! serializes recognition events and direct engine calls.

mod error;
pub mod segmenter;
mod session;

pub use segmenter::{contains_command, segment, strip_commands, SegmentDecision};
pub use session::{RecordingSession, RecordingStatus, SlideSegment};

use crate::recognition::{
    RecognitionConfig, RecognitionEvent, RecognitionEventReceiver, RecognitionProvider,
    RecognitionSource, ResultEvent,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Capture event for subscribers
#[derive(Clone, Debug)]
pub enum CaptureEvent {
    /// Interim hypothesis replaced (empty when the utterance finalized)
    InterimTranscript { text: String },
    /// Accumulated live transcript changed
    LiveTranscript { text: String },
    /// A slide segment was committed
    SlideCommitted { segment: SlideSegment },
    /// Recognition error, already mapped to a user-facing message
    Error { message: String },
    /// The recognition source stopped producing results
    Ended,
}

/// Capture engine for a single recording session
///
/// Create one engine per capture attempt, or call `reset()` between
/// attempts; a session must not be shared across independent captures.
pub struct CaptureEngine {
    provider: Box<dyn RecognitionProvider>,
    supported: bool,
    config: RecognitionConfig,
    session: Arc<Mutex<RecordingSession>>,
    event_tx: broadcast::Sender<CaptureEvent>,
    source: Option<Box<dyn RecognitionSource>>,
    pump: Option<tokio::task::JoinHandle<()>>,
}

impl CaptureEngine {
    /// Create an engine with the default recognition config
    ///
    /// The provider's availability is probed exactly once, here; if the
    /// capability is absent, `start()` degrades to setting an error.
    pub fn new(provider: Box<dyn RecognitionProvider>) -> Self {
        Self::with_config(provider, RecognitionConfig::default())
    }

    /// Create an engine with an explicit recognition config
    pub fn with_config(provider: Box<dyn RecognitionProvider>, config: RecognitionConfig) -> Self {
        let supported = provider.is_available();
        if !supported {
            warn!("Speech recognition capability is not available");
        }
        let (event_tx, _) = broadcast::channel(100);
        Self {
            provider,
            supported,
            config,
            session: Arc::new(Mutex::new(RecordingSession::default())),
            event_tx,
            source: None,
            pump: None,
        }
    }

    /// Whether recognition capability was available at construction
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Subscribe to capture events
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the current session state
    pub fn session(&self) -> RecordingSession {
        self.lock_session().clone()
    }

    /// Shared handle to the session state
    pub fn session_arc(&self) -> Arc<Mutex<RecordingSession>> {
        self.session.clone()
    }

    /// Start capturing
    ///
    /// No-op while already recording. Without recognition capability, or if
    /// source construction fails, the session records an error and the
    /// status stays `Idle` - nothing is thrown.
    pub fn start(&mut self) {
        if !self.supported {
            self.lock_session().last_error = Some(error::UNSUPPORTED_MESSAGE.to_string());
            return;
        }

        if self.lock_session().status == RecordingStatus::Recording {
            debug!("start() called while already recording; ignoring");
            return;
        }

        // Release any stale handle from a previous errored or ended attempt
        self.source = None;
        self.pump = None;

        match self.provider.create(&self.config) {
            Ok((mut source, event_rx)) => {
                self.pump = Some(spawn_event_pump(
                    event_rx,
                    self.session.clone(),
                    self.event_tx.clone(),
                ));
                {
                    let mut session = self.lock_session();
                    session.status = RecordingStatus::Recording;
                    session.last_error = None;
                }
                source.start();
                self.source = Some(source);
                info!(language = %self.config.language, "Recording started");
            }
            Err(e) => {
                error!("Failed to construct recognition source: {}", e);
                self.lock_session().last_error = Some(error::START_FAILED_MESSAGE.to_string());
            }
        }
    }

    /// Stop capturing and return the committed deck
    ///
    /// Flushes pending text synchronously so the returned snapshot already
    /// contains the final slide, without waiting for the source's
    /// asynchronous end notification. Safe to call in any state; the
    /// released source handle is never reused.
    pub fn stop(&mut self) -> Vec<SlideSegment> {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.pump = None;

        let mut session = self.lock_session();
        if let Some(segment) = session.commit_pending() {
            let _ = self.event_tx.send(CaptureEvent::SlideCommitted { segment });
        }
        if session.status == RecordingStatus::Recording {
            session.status = RecordingStatus::Stopped;
        }
        info!(slides = session.committed_slides.len(), "Recording stopped");
        session.committed_slides.clone()
    }

    /// Commit the pending text as a new slide, the manual equivalent of the
    /// spoken command
    ///
    /// No-op when nothing is pending, in any state.
    pub fn new_slide(&mut self) -> Option<SlideSegment> {
        let committed = self.lock_session().commit_pending();
        if let Some(segment) = &committed {
            info!(index = segment.index, "Slide committed manually");
            let _ = self.event_tx.send(CaptureEvent::SlideCommitted {
                segment: segment.clone(),
            });
        }
        committed
    }

    /// Fully reinitialize: stop any active source and clear the session,
    /// discarding committed slides
    pub fn reset(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.pump = None;
        self.lock_session().reset();
        info!("Capture session reset");
    }

    /// Lock the session, recovering state if the mutex was poisoned
    fn lock_session(&self) -> MutexGuard<'_, RecordingSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Session mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Spawn the task that drains a source's event stream into the session
fn spawn_event_pump(
    mut event_rx: RecognitionEventReceiver,
    session: Arc<Mutex<RecordingSession>>,
    event_tx: broadcast::Sender<CaptureEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            apply_recognition_event(&session, &event_tx, event);
        }
        debug!("Recognition event stream closed");
    })
}

/// Apply one recognition event to the session
pub(crate) fn apply_recognition_event(
    session: &Arc<Mutex<RecordingSession>>,
    event_tx: &broadcast::Sender<CaptureEvent>,
    event: RecognitionEvent,
) {
    let mut session = match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Session mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    };

    match event {
        RecognitionEvent::Result(result) => {
            handle_result_event(&mut session, event_tx, &result);
        }
        RecognitionEvent::Error { code } => {
            let message = error::classify_error_code(&code);
            error!(code = %code, "{}", message);
            session.last_error = Some(message.clone());
            // Any source-reported error ends the current attempt
            if session.status == RecordingStatus::Recording {
                session.status = RecordingStatus::Stopped;
            }
            let _ = event_tx.send(CaptureEvent::Error { message });
        }
        RecognitionEvent::End => {
            // Pending text is deliberately NOT flushed here: a spontaneous
            // end is not the user's intent, and the caller can still read
            // current_text and decide to flush via new_slide() or stop().
            if session.status == RecordingStatus::Recording {
                session.status = RecordingStatus::Stopped;
                info!("Recognition source ended");
            }
            let _ = event_tx.send(CaptureEvent::Ended);
        }
    }
}

/// Fold a result batch into the session
fn handle_result_event(
    session: &mut RecordingSession,
    event_tx: &broadcast::Sender<CaptureEvent>,
    event: &ResultEvent,
) {
    if session.status != RecordingStatus::Recording {
        debug!("Dropping result event outside an active recording");
        return;
    }

    let mut final_text = String::new();
    let mut interim = String::new();
    for result in &event.results {
        if result.is_final {
            final_text.push_str(result.transcript());
        } else {
            interim.push_str(result.transcript());
        }
    }

    // Interim state has no memory across events
    session.interim_text = interim.clone();
    let _ = event_tx.send(CaptureEvent::InterimTranscript { text: interim });

    if final_text.is_empty() {
        return;
    }

    if let Some(segment) = session.apply_final(&final_text) {
        debug!(index = segment.index, "Slide committed by voice command");
        let _ = event_tx.send(CaptureEvent::SlideCommitted { segment });
        // Committed content disappears from the in-progress display at once
        let _ = event_tx.send(CaptureEvent::LiveTranscript {
            text: String::new(),
        });
    } else {
        let _ = event_tx.send(CaptureEvent::LiveTranscript {
            text: session.live_transcript(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::{
        ProviderError, RecognitionEventSender, RecognitionResult,
    };
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;

    /// Route engine logs through the test harness writer
    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    /// Scripted source: emits End when stopped, like a real source does
    struct FakeSource {
        events: RecognitionEventSender,
        started: Arc<StdMutex<bool>>,
    }

    impl RecognitionSource for FakeSource {
        fn start(&mut self) {
            *self.started.lock().unwrap() = true;
        }

        fn stop(&mut self) {
            let _ = self.events.send(RecognitionEvent::End);
        }
    }

    /// Provider that hands the test a sender into the live source's stream
    struct FakeProvider {
        available: bool,
        fail_create: bool,
        sender: Arc<StdMutex<Option<RecognitionEventSender>>>,
        started: Arc<StdMutex<bool>>,
    }

    impl FakeProvider {
        fn new(available: bool) -> (Self, Arc<StdMutex<Option<RecognitionEventSender>>>) {
            let sender = Arc::new(StdMutex::new(None));
            let provider = Self {
                available,
                fail_create: false,
                sender: sender.clone(),
                started: Arc::new(StdMutex::new(false)),
            };
            (provider, sender)
        }
    }

    impl RecognitionProvider for FakeProvider {
        fn is_available(&self) -> bool {
            self.available
        }

        fn create(
            &self,
            _config: &RecognitionConfig,
        ) -> Result<(Box<dyn RecognitionSource>, RecognitionEventReceiver), ProviderError> {
            if self.fail_create {
                return Err(ProviderError::Construction("boom".to_string()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            *self.sender.lock().unwrap() = Some(tx.clone());
            Ok((
                Box::new(FakeSource {
                    events: tx,
                    started: self.started.clone(),
                }),
                rx,
            ))
        }
    }

    fn result_event(results: Vec<RecognitionResult>) -> RecognitionEvent {
        RecognitionEvent::Result(ResultEvent {
            result_index: 0,
            results,
        })
    }

    fn final_chunk(text: &str) -> RecognitionEvent {
        result_event(vec![RecognitionResult::new(true, text)])
    }

    fn interim_chunk(text: &str) -> RecognitionEvent {
        result_event(vec![RecognitionResult::new(false, text)])
    }

    /// Deliver an event to the engine's session the way the pump does
    fn deliver(engine: &CaptureEngine, event: RecognitionEvent) {
        apply_recognition_event(&engine.session_arc(), &engine.event_tx, event);
    }

    fn recording_engine() -> CaptureEngine {
        init_tracing();
        let (provider, _) = FakeProvider::new(true);
        let mut engine = CaptureEngine::new(Box::new(provider));
        engine.start();
        engine
    }

    #[tokio::test]
    async fn test_start_sets_recording_and_clears_error() {
        let engine = recording_engine();
        assert!(engine.is_supported());
        assert_eq!(engine.session().status, RecordingStatus::Recording);
        assert!(engine.session().last_error.is_none());
    }

    #[tokio::test]
    async fn test_start_unsupported_sets_error_and_stays_idle() {
        let (provider, _) = FakeProvider::new(false);
        let mut engine = CaptureEngine::new(Box::new(provider));
        assert!(!engine.is_supported());
        engine.start();
        let session = engine.session();
        assert_eq!(session.status, RecordingStatus::Idle);
        assert!(session.last_error.unwrap().contains("not supported"));
    }

    #[tokio::test]
    async fn test_start_construction_failure_sets_error() {
        let sender = Arc::new(StdMutex::new(None));
        let provider = FakeProvider {
            available: true,
            fail_create: true,
            sender,
            started: Arc::new(StdMutex::new(false)),
        };
        let mut engine = CaptureEngine::new(Box::new(provider));
        engine.start();
        let session = engine.session();
        assert_eq!(session.status, RecordingStatus::Idle);
        assert_eq!(session.last_error.as_deref(), Some("Failed to start recording."));
    }

    #[tokio::test]
    async fn test_reentrant_start_is_a_noop() {
        let (provider, sender) = FakeProvider::new(true);
        let mut engine = CaptureEngine::new(Box::new(provider));
        engine.start();
        let first_sender = sender.lock().unwrap().take();
        engine.start();
        // A second source must not have been constructed
        assert!(sender.lock().unwrap().is_none());
        assert!(first_sender.is_some());
    }

    #[tokio::test]
    async fn test_final_text_accumulates_then_stop_flushes() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("Hello world"));
        assert_eq!(engine.session().live_transcript(), "Hello world");
        assert!(engine.session().committed_slides.is_empty());

        let deck = engine.stop();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].index, 1);
        assert_eq!(deck[0].text, "Hello world");
        assert_eq!(engine.session().status, RecordingStatus::Stopped);
    }

    #[tokio::test]
    async fn test_command_with_residual_commits_residual() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("Introduction to the topic next slide"));
        let session = engine.session();
        assert_eq!(session.committed_slides.len(), 1);
        assert_eq!(session.committed_slides[0].text, "Introduction to the topic");
        assert_eq!(session.current_text, "");
        engine.stop();
    }

    #[tokio::test]
    async fn test_bare_command_with_nothing_pending_is_skipped() {
        let engine = recording_engine();
        deliver(&engine, final_chunk("next slide"));
        assert!(engine.session().committed_slides.is_empty());
    }

    #[tokio::test]
    async fn test_multi_chunk_accumulation_before_command() {
        let engine = recording_engine();
        deliver(&engine, final_chunk("First part"));
        assert_eq!(engine.session().live_transcript(), "First part");
        deliver(&engine, final_chunk("second part new slide"));
        let session = engine.session();
        assert_eq!(session.committed_slides.len(), 1);
        assert_eq!(session.committed_slides[0].text, "First part second part");
    }

    #[tokio::test]
    async fn test_new_slide_commits_once() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("Pending text"));
        let segment = engine.new_slide().unwrap();
        assert_eq!(segment.index, 1);
        assert_eq!(segment.text, "Pending text");
        assert_eq!(engine.session().current_text, "");
        // Nothing pending now, so no second segment
        assert!(engine.new_slide().is_none());
        assert_eq!(engine.session().committed_slides.len(), 1);
    }

    #[tokio::test]
    async fn test_interim_replaced_not_accumulated() {
        let engine = recording_engine();
        deliver(&engine, interim_chunk("typing"));
        assert_eq!(engine.session().interim_text, "typing");
        deliver(&engine, interim_chunk("typing more"));
        assert_eq!(engine.session().interim_text, "typing more");
        // A final-only event clears the interim
        deliver(&engine, final_chunk("typing more done"));
        assert_eq!(engine.session().interim_text, "");
    }

    #[tokio::test]
    async fn test_mixed_batch_partitions_final_and_interim() {
        let engine = recording_engine();
        deliver(
            &engine,
            result_event(vec![
                RecognitionResult::new(true, "committed part"),
                RecognitionResult::new(false, "still speaking"),
            ]),
        );
        let session = engine.session();
        assert_eq!(session.live_transcript(), "committed part");
        assert_eq!(session.interim_text, "still speaking");
    }

    #[tokio::test]
    async fn test_not_allowed_error_then_restart_recovers() {
        let mut engine = recording_engine();
        deliver(
            &engine,
            RecognitionEvent::Error {
                code: "not-allowed".to_string(),
            },
        );
        let session = engine.session();
        assert!(session.last_error.as_deref().unwrap().contains("Microphone"));
        assert_ne!(session.status, RecordingStatus::Recording);

        engine.start();
        let session = engine.session();
        assert_eq!(session.status, RecordingStatus::Recording);
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_errors_do_not_corrupt_committed_slides() {
        let engine = recording_engine();
        deliver(&engine, final_chunk("keep me next slide"));
        deliver(
            &engine,
            RecognitionEvent::Error {
                code: "no-speech".to_string(),
            },
        );
        let session = engine.session();
        assert_eq!(session.committed_slides.len(), 1);
        assert!(session.last_error.as_deref().unwrap().contains("No speech"));
    }

    #[tokio::test]
    async fn test_spontaneous_end_does_not_flush_pending() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("unflushed"));
        deliver(&engine, RecognitionEvent::End);
        let session = engine.session();
        assert_eq!(session.status, RecordingStatus::Stopped);
        assert!(session.committed_slides.is_empty());
        // The caller can still recover the pending text afterwards
        assert_eq!(session.live_transcript(), "unflushed");
        let deck = engine.stop();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].text, "unflushed");
    }

    #[tokio::test]
    async fn test_events_dropped_outside_recording() {
        let (provider, _) = FakeProvider::new(true);
        let engine = CaptureEngine::new(Box::new(provider));
        // Never started: still Idle, so results must not be applied
        deliver(&engine, final_chunk("too early"));
        assert_eq!(engine.session().current_text, "");
        assert!(engine.session().committed_slides.is_empty());
    }

    #[tokio::test]
    async fn test_reset_from_any_state() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("one next slide"));
        deliver(&engine, final_chunk("pending"));
        engine.reset();
        let session = engine.session();
        assert_eq!(session.status, RecordingStatus::Idle);
        assert!(session.committed_slides.is_empty());
        assert_eq!(session.current_text, "");
        assert_eq!(session.interim_text, "");
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_indices_contiguous_across_skipped_commits() {
        let mut engine = recording_engine();
        deliver(&engine, final_chunk("one next slide"));
        deliver(&engine, final_chunk("new slide")); // skip: nothing pending
        deliver(&engine, final_chunk("two next slide"));
        deliver(&engine, final_chunk("three"));
        let deck = engine.stop();
        let indices: Vec<usize> = deck.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let texts: Vec<&str> = deck.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_subscribers_observe_commits_and_errors() {
        let mut engine = recording_engine();
        let mut events = engine.subscribe();
        deliver(&engine, final_chunk("content next slide"));
        deliver(
            &engine,
            RecognitionEvent::Error {
                code: "aborted".to_string(),
            },
        );

        let mut saw_commit = false;
        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            match event {
                CaptureEvent::SlideCommitted { segment } => {
                    assert_eq!(segment.text, "content");
                    saw_commit = true;
                }
                CaptureEvent::Error { message } => {
                    assert!(message.contains("aborted"));
                    saw_error = true;
                }
                _ => {}
            }
        }
        assert!(saw_commit);
        assert!(saw_error);
        engine.stop();
    }

    #[tokio::test]
    async fn test_end_to_end_through_the_event_pump() {
        let (provider, sender) = FakeProvider::new(true);
        let started = provider.started.clone();
        let mut engine = CaptureEngine::new(Box::new(provider));
        engine.start();
        assert!(*started.lock().unwrap());

        let tx = sender.lock().unwrap().clone().unwrap();
        tx.send(final_chunk("spoken through the pump next slide"))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let session = engine.session();
        assert_eq!(session.committed_slides.len(), 1);
        assert_eq!(session.committed_slides[0].text, "spoken through the pump");

        let deck = engine.stop();
        assert_eq!(deck.len(), 1);
    }
}
