//! Uniform start/stop/speak/interrupt contract over speech engines

use std::collections::VecDeque;

use super::{
    EngineEvent, EngineEvents, Recognizer, SpeechEvent, Synthesizer, UtteranceId,
};
use crate::Language;

/// Wraps a recognizer and a synthesizer
///
/// Holds only engine state (listening flag, in-flight utterance). Lifecycle
/// signals are queued and collected with [`SpeechAdapter::take_events`].
/// Every `speak` and every `interrupt` produces exactly one
/// [`SpeechEvent::SpeakEnded`].
pub struct SpeechAdapter {
    recognizer: Box<dyn Recognizer>,
    synthesizer: Box<dyn Synthesizer>,
    engine_events: EngineEvents,
    language: Language,
    listening: bool,
    utterance: Option<UtteranceId>,
    next_utterance: u64,
    outbox: VecDeque<SpeechEvent>,
}

impl SpeechAdapter {
    /// Create an adapter over the given engines
    ///
    /// `engine_events` must be the receiver paired with the sink the
    /// engines were built with.
    #[must_use]
    pub fn new(
        recognizer: Box<dyn Recognizer>,
        synthesizer: Box<dyn Synthesizer>,
        engine_events: EngineEvents,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
            engine_events,
            language: Language::default(),
            listening: false,
            utterance: None,
            next_utterance: 0,
            outbox: VecDeque::new(),
        }
    }

    /// True only if both recognition and synthesis are available
    #[must_use]
    pub fn supported(&self) -> bool {
        self.recognizer.available() && self.synthesizer.available()
    }

    /// Whether a listening session is active
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    /// Whether an utterance is in flight
    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.utterance.is_some()
    }

    /// Locale used for the next operation
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Change the locale for subsequent operations
    pub fn set_language(&mut self, language: Language) {
        tracing::debug!(language = %language, "speech language set");
        self.language = language;
    }

    /// Begin capturing one utterance; no-op if already listening
    pub fn start_listening(&mut self) {
        if self.listening {
            return;
        }

        match self.recognizer.start(self.language) {
            Ok(()) => self.listening = true,
            Err(e) => {
                tracing::error!(error = %e, "could not start recognition");
                self.listening = false;
            }
        }
    }

    /// End capture early; no-op if not listening
    pub fn stop_listening(&mut self) {
        if self.listening {
            self.recognizer.stop();
        }
    }

    /// Cancel in-flight speech, then speak `text`
    pub fn speak(&mut self, text: &str) {
        self.synthesizer.cancel();
        if self.utterance.take().is_some() {
            self.outbox.push_back(SpeechEvent::SpeakEnded);
        }

        let id = UtteranceId::new(self.next_utterance);
        self.next_utterance += 1;
        self.utterance = Some(id);

        if let Err(e) = self.synthesizer.speak(id, text, self.language) {
            tracing::error!(error = %e, "speech synthesis error");
            self.utterance = None;
            self.outbox.push_back(SpeechEvent::SpeakEnded);
        }
    }

    /// Cancel in-flight speech without speaking anything
    ///
    /// Always queues a `SpeakEnded` before returning.
    pub fn interrupt(&mut self) {
        self.synthesizer.cancel();
        if self.utterance.take().is_some() {
            self.outbox.push_back(SpeechEvent::SpeakEnded);
        }
        self.outbox.push_back(SpeechEvent::SpeakEnded);
    }

    /// Wait for the next raw engine event
    pub async fn next_engine_event(&mut self) -> Option<EngineEvent> {
        self.engine_events.recv().await
    }

    /// Translate a raw engine event into lifecycle signals
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ListenStarted => {
                self.listening = true;
                self.outbox.push_back(SpeechEvent::ListenStarted);
            }
            EngineEvent::Transcript(transcript) => {
                if self.listening {
                    self.outbox.push_back(SpeechEvent::Transcript(transcript));
                } else {
                    tracing::debug!("transcript after session end ignored");
                }
            }
            EngineEvent::ListenError(error) => {
                tracing::error!(error = %error, "speech recognition error");
                self.end_listening();
            }
            EngineEvent::ListenEnded => self.end_listening(),
            EngineEvent::SpeakStarted(id) => {
                if self.utterance == Some(id) {
                    self.outbox.push_back(SpeechEvent::SpeakStarted);
                }
            }
            EngineEvent::SpeakEnded(id) => self.end_utterance(id),
            EngineEvent::SpeakError(id, error) => {
                tracing::error!(utterance = id.get(), error = %error, "speech synthesis error");
                self.end_utterance(id);
            }
        }
    }

    /// Drain queued lifecycle signals
    pub fn take_events(&mut self) -> Vec<SpeechEvent> {
        self.outbox.drain(..).collect()
    }

    fn end_listening(&mut self) {
        if self.listening {
            self.listening = false;
            self.outbox.push_back(SpeechEvent::ListenStopped);
        }
    }

    fn end_utterance(&mut self, id: UtteranceId) {
        // Superseded utterances already reported their end
        if self.utterance == Some(id) {
            self.utterance = None;
            self.outbox.push_back(SpeechEvent::SpeakEnded);
        }
    }
}
