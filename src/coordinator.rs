//! Conversation coordinator
//!
//! Owns the [`Session`], applies events to it and executes the resulting
//! effects against the speech adapter and the response generator. All
//! session mutation happens on the coordinator's event loop.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Language;
use crate::conversation::{Effect, Event, Rejection, Session, Transition};
use crate::generator::{Generation, ResponseGenerator};
use crate::voice::{EngineEvent, SpeechAdapter, SpeechEvent};

/// User input from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Mic control pressed
    ToggleMic,
    /// Language picked in the selector
    SelectLanguage(Language),
    /// Leave the conversation
    Quit,
}

impl From<SpeechEvent> for Event {
    fn from(event: SpeechEvent) -> Self {
        match event {
            SpeechEvent::ListenStarted => Self::ListenStarted,
            SpeechEvent::ListenStopped => Self::ListenStopped,
            SpeechEvent::Transcript(text) => Self::Transcript(text),
            SpeechEvent::SpeakStarted => Self::SpeakStarted,
            SpeechEvent::SpeakEnded => Self::SpeakEnded,
        }
    }
}

/// Drives one conversation
pub struct Coordinator {
    session: Session,
    adapter: SpeechAdapter,
    generator: Arc<dyn ResponseGenerator>,
    replies_tx: mpsc::UnboundedSender<Generation>,
    replies_rx: mpsc::UnboundedReceiver<Generation>,
}

impl Coordinator {
    /// Create a coordinator; the adapter adopts the session's language
    #[must_use]
    pub fn new(
        session: Session,
        mut adapter: SpeechAdapter,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        adapter.set_language(session.language());
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            session,
            adapter,
            generator,
            replies_tx,
            replies_rx,
        }
    }

    /// Current session
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Speech adapter
    #[must_use]
    pub const fn adapter(&self) -> &SpeechAdapter {
        &self.adapter
    }

    /// Press the mic control
    pub fn toggle_mic(&mut self) -> Option<Rejection> {
        self.dispatch(Event::MicToggled)
    }

    /// Pick a language
    pub fn select_language(&mut self, language: Language) -> Option<Rejection> {
        self.dispatch(Event::LanguageSelected(language))
    }

    /// Apply `event` and everything it synchronously causes
    ///
    /// Adapter signals queued while executing effects (such as the
    /// speak-end from an interrupt) are applied before returning. Returns
    /// the rejection of `event` itself, if any.
    pub fn dispatch(&mut self, event: Event) -> Option<Rejection> {
        let mut pending = VecDeque::from([event]);
        let mut rejection = None;
        let mut first = true;

        while let Some(event) = pending.pop_front() {
            tracing::trace!(event = ?event, status = ?self.session.status(), "applying event");

            let Transition {
                session,
                effects,
                rejected,
            } = std::mem::take(&mut self.session).apply(event);
            self.session = session;

            if first {
                rejection = rejected;
                first = false;
            }
            if let Some(reason) = rejected {
                tracing::debug!(reason = ?reason, "input rejected");
            }

            for effect in effects {
                self.execute(effect);
            }
            pending.extend(self.adapter.take_events().into_iter().map(Event::from));
        }

        rejection
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Interrupt => self.adapter.interrupt(),
            Effect::StartListening => self.adapter.start_listening(),
            Effect::StopListening => self.adapter.stop_listening(),
            Effect::Speak(text) => self.adapter.speak(&text),
            Effect::SetLanguage(language) => self.adapter.set_language(language),
            Effect::Generate { prompt, history } => {
                tracing::info!(prompt = %prompt, history = history.len(), "generating response");
                let generator = Arc::clone(&self.generator);
                let replies = self.replies_tx.clone();
                tokio::spawn(async move {
                    let generation = generator.generate(&prompt, &history).await;
                    if replies.send(generation).is_err() {
                        tracing::debug!("coordinator gone, response dropped");
                    }
                });
            }
        }
    }

    /// Record a finished generation
    pub fn handle_reply(&mut self, generation: Generation) {
        if let Generation::Failed(reason) = &generation {
            tracing::warn!(reason = %reason, "generation failed, using fallback reply");
        }
        self.dispatch(Event::ResponseReady(generation.into_text()));
    }

    /// Feed a raw engine event through the adapter
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        self.adapter.handle_engine_event(event);
        for signal in self.adapter.take_events() {
            self.dispatch(signal.into());
        }
    }

    /// Wait for and handle one engine event or generation result
    ///
    /// Returns `false` once both sources are closed.
    pub async fn process_next(&mut self) -> bool {
        tokio::select! {
            Some(event) = self.adapter.next_engine_event() => {
                self.handle_engine_event(event);
                true
            }
            Some(generation) = self.replies_rx.recv() => {
                self.handle_reply(generation);
                true
            }
            else => false,
        }
    }

    /// Run until [`Command::Quit`] or the command channel closes
    ///
    /// `render` is called with the session initially and after every
    /// handled input, along with the rejection of the command just handled.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut render: impl FnMut(&Session, Option<Rejection>),
    ) {
        render(&self.session, None);

        loop {
            let mut rejection = None;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::ToggleMic) => rejection = self.toggle_mic(),
                    Some(Command::SelectLanguage(language)) => {
                        rejection = self.select_language(language);
                        if rejection.is_none() {
                            tracing::info!(language = %language, "language changed");
                        }
                    }
                    Some(Command::Quit) | None => break,
                },
                Some(event) = self.adapter.next_engine_event() => self.handle_engine_event(event),
                Some(generation) = self.replies_rx.recv() => self.handle_reply(generation),
            }
            render(&self.session, rejection);
        }

        self.shutdown();
    }

    /// Stop listening and cancel speech
    pub fn shutdown(&mut self) {
        tracing::info!("shutting down conversation");
        self.adapter.stop_listening();
        self.adapter.interrupt();
        // Signals raised while tearing down are not applied
        self.adapter.take_events();
    }
}
