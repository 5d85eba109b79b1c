//! Speech I/O
//!
//! Recognition and synthesis engines sit behind the [`Recognizer`] and
//! [`Synthesizer`] traits and report progress as [`EngineEvent`]s. The
//! [`SpeechAdapter`] turns those into the lifecycle signals the
//! conversation consumes ([`SpeechEvent`]).

mod adapter;
mod capture;
mod cloud;
mod endpoint;
mod playback;
pub mod scripted;
mod stt;
mod tts;

use tokio::sync::mpsc;

pub use adapter::SpeechAdapter;
pub use capture::{AudioCapture, SAMPLE_RATE, input_available, samples_to_wav};
pub use cloud::{CloudRecognizer, CloudSynthesizer};
pub use endpoint::{Endpoint, UtteranceEndpointer};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, output_available};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

use crate::{Language, Result};

/// Default base URL for the `OpenAI` speech endpoints
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Identifies one `speak` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Raw events reported by speech engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Capture began
    ListenStarted,
    /// Final transcript for the current listening session
    Transcript(String),
    /// Recognition failed
    ListenError(String),
    /// Listening session is over
    ListenEnded,
    /// Playback of an utterance began
    SpeakStarted(UtteranceId),
    /// Playback finished or was cancelled
    SpeakEnded(UtteranceId),
    /// Synthesis or playback failed
    SpeakError(UtteranceId, String),
}

/// Lifecycle signals raised by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Capture began
    ListenStarted,
    /// Capture ended, with or without a transcript
    ListenStopped,
    /// Final transcript of the utterance
    Transcript(String),
    /// Playback began
    SpeakStarted,
    /// Playback is over (completed, failed, or interrupted)
    SpeakEnded,
}

/// Receiving half of the engine event channel
pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

/// Sending half of the engine event channel, handed to engines
#[derive(Debug, Clone)]
pub struct EngineSink(mpsc::UnboundedSender<EngineEvent>);

impl EngineSink {
    /// Report an engine event
    pub fn send(&self, event: EngineEvent) {
        if self.0.send(event).is_err() {
            tracing::trace!("speech adapter gone, engine event dropped");
        }
    }
}

/// Create the channel engines report through
#[must_use]
pub fn engine_channel() -> (EngineSink, EngineEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineSink(tx), rx)
}

/// Speech-to-text engine
///
/// One call to [`Recognizer::start`] is one listening session: the engine
/// reports `ListenStarted`, at most one `Transcript` or `ListenError`, and
/// finally `ListenEnded`.
pub trait Recognizer: Send {
    /// Whether the host can capture speech
    fn available(&self) -> bool {
        true
    }

    /// Begin capturing one utterance
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot start
    fn start(&mut self, language: Language) -> Result<()>;

    /// End capture early
    fn stop(&mut self);
}

/// Text-to-speech engine
pub trait Synthesizer: Send {
    /// Whether the host can play speech
    fn available(&self) -> bool {
        true
    }

    /// Synthesize and play `text`, reporting progress under `id`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis cannot be started
    fn speak(&mut self, id: UtteranceId, text: &str, language: Language) -> Result<()>;

    /// Abort in-flight playback
    fn cancel(&mut self);
}
