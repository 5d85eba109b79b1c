//! Scripted speech engines
//!
//! Used by `--text` mode, where typed lines stand in for speech, and by
//! tests. Events are reported synchronously from the engine calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{EngineEvent, EngineSink, Recognizer, Synthesizer, UtteranceId};
use crate::{Language, Result};

/// What the next listening session hears
#[derive(Debug, Clone, PartialEq, Eq)]
enum Heard {
    Transcript(String),
    Silence,
    Error(String),
}

/// Where a pushed transcript went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the listening session that was already open
    Live,
    /// Kept for the next listening session
    Queued,
}

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<Heard>,
    /// Sink of the open session waiting for input
    open: Option<EngineSink>,
}

/// Shared queue feeding a [`ScriptedRecognizer`]
#[derive(Debug, Clone, Default)]
pub struct TranscriptQueue(Arc<Mutex<QueueInner>>);

impl TranscriptQueue {
    /// Deliver `transcript` to the open session, or queue it for the next
    pub fn push_transcript(&self, transcript: impl Into<String>) -> Delivery {
        let transcript = transcript.into();
        let mut inner = self.lock();
        if let Some(sink) = inner.open.take() {
            sink.send(EngineEvent::Transcript(transcript));
            sink.send(EngineEvent::ListenEnded);
            Delivery::Live
        } else {
            inner.pending.push_back(Heard::Transcript(transcript));
            Delivery::Queued
        }
    }

    /// Next session ends without detecting speech
    pub fn push_silence(&self) {
        self.lock().pending.push_back(Heard::Silence);
    }

    /// Next session fails with an engine error
    pub fn push_error(&self, error: impl Into<String>) {
        self.lock().pending.push_back(Heard::Error(error.into()));
    }

    /// Number of queued sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a session is open and waiting for input
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.lock().open.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Recognizer that replays queued transcripts
///
/// With an empty queue the session stays open until a transcript is pushed
/// or [`Recognizer::stop`] is called.
pub struct ScriptedRecognizer {
    sink: EngineSink,
    queue: TranscriptQueue,
}

impl ScriptedRecognizer {
    /// Create a recognizer reading from `queue`
    #[must_use]
    pub const fn new(sink: EngineSink, queue: TranscriptQueue) -> Self {
        Self { sink, queue }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn start(&mut self, language: Language) -> Result<()> {
        let mut inner = self.queue.lock();
        if inner.open.is_some() {
            return Ok(());
        }
        tracing::debug!(language = %language, "scripted recognition started");
        self.sink.send(EngineEvent::ListenStarted);

        match inner.pending.pop_front() {
            Some(Heard::Transcript(transcript)) => {
                self.sink.send(EngineEvent::Transcript(transcript));
                self.sink.send(EngineEvent::ListenEnded);
            }
            Some(Heard::Silence) => self.sink.send(EngineEvent::ListenEnded),
            Some(Heard::Error(error)) => {
                self.sink.send(EngineEvent::ListenError(error));
                self.sink.send(EngineEvent::ListenEnded);
            }
            None => inner.open = Some(self.sink.clone()),
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.queue.lock().open.take() {
            sink.send(EngineEvent::ListenEnded);
        }
    }
}

/// How a [`ScriptedSynthesizer`] plays utterances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Start and finish immediately
    Complete,
    /// Start and keep playing until cancelled
    Hold,
    /// Fail without starting
    Fail,
}

#[derive(Debug, Default)]
struct SpeechLogInner {
    spoken: Vec<(String, Language)>,
    cancels: usize,
}

/// Record of what a [`ScriptedSynthesizer`] was asked to do
#[derive(Debug, Clone, Default)]
pub struct SpeechLog(Arc<Mutex<SpeechLogInner>>);

impl SpeechLog {
    /// Texts passed to `speak`, in order
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.lock().spoken.iter().map(|(text, _)| text.clone()).collect()
    }

    /// Locale of each `speak` call, in order
    #[must_use]
    pub fn languages(&self) -> Vec<Language> {
        self.lock().spoken.iter().map(|(_, lang)| *lang).collect()
    }

    /// Number of utterances cut short by `cancel`
    #[must_use]
    pub fn cancels(&self) -> usize {
        self.lock().cancels
    }

    fn lock(&self) -> MutexGuard<'_, SpeechLogInner> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Synthesizer that records instead of playing
pub struct ScriptedSynthesizer {
    sink: EngineSink,
    log: SpeechLog,
    mode: PlaybackMode,
    current: Option<UtteranceId>,
}

impl ScriptedSynthesizer {
    /// Create a synthesizer writing to `log`
    #[must_use]
    pub const fn new(sink: EngineSink, log: SpeechLog, mode: PlaybackMode) -> Self {
        Self {
            sink,
            log,
            mode,
            current: None,
        }
    }
}

impl Synthesizer for ScriptedSynthesizer {
    fn speak(&mut self, id: UtteranceId, text: &str, language: Language) -> Result<()> {
        self.log.lock().spoken.push((text.to_string(), language));

        match self.mode {
            PlaybackMode::Complete => {
                self.sink.send(EngineEvent::SpeakStarted(id));
                self.sink.send(EngineEvent::SpeakEnded(id));
            }
            PlaybackMode::Hold => {
                self.sink.send(EngineEvent::SpeakStarted(id));
                self.current = Some(id);
            }
            PlaybackMode::Fail => {
                self.sink
                    .send(EngineEvent::SpeakError(id, "scripted playback failure".to_string()));
            }
        }
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(id) = self.current.take() {
            self.log.lock().cancels += 1;
            self.sink.send(EngineEvent::SpeakEnded(id));
        }
    }
}
