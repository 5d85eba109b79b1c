//! Conversation session and turn state machine
//!
//! The session is a plain value. Every input is an [`Event`] and
//! [`Session::apply`] returns the next session together with the
//! [`Effect`]s the coordinator must carry out. Nothing here performs I/O.

use crate::Language;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The person talking to the assistant
    User,
    /// The assistant
    Assistant,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    /// Create a user message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    /// Who wrote the message
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Message text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Where the current turn is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnStatus {
    /// Waiting for the user to press the mic
    #[default]
    Idle,
    /// Capturing the user's utterance
    Listening,
    /// Waiting on the language model
    Processing,
    /// Playing the assistant's reply
    Speaking,
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The mic control was pressed
    MicToggled,
    /// A language was picked in the selector
    LanguageSelected(Language),
    /// Recognition engine began capturing
    ListenStarted,
    /// Recognition session ended (naturally, by stop, or on error)
    ListenStopped,
    /// Final transcript of the utterance, possibly empty
    Transcript(String),
    /// Assistant text is ready (a reply or the fallback)
    ///
    /// Always appended to the log. Spoken unless the user is already
    /// listening again, so listening and speaking never overlap.
    ResponseReady(String),
    /// Playback of the reply began
    SpeakStarted,
    /// Playback finished, failed, or was interrupted
    SpeakEnded,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel any in-flight speech
    Interrupt,
    /// Begin capturing one utterance
    StartListening,
    /// End capture early
    StopListening,
    /// Ask the response generator for the next reply
    Generate {
        /// Latest user utterance
        prompt: String,
        /// Conversation so far, oldest first, ending with the prompt
        history: Vec<Message>,
    },
    /// Speak assistant text
    Speak(String),
    /// Switch the speech locale for subsequent operations
    SetLanguage(Language),
}

/// Why an input was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The mic control is disabled while a reply is being generated
    MicDisabled,
    /// The language can only change while idle
    LanguageLocked,
}

/// Result of applying an event
#[derive(Debug)]
pub struct Transition {
    /// Next session
    pub session: Session,
    /// Effects to execute, in order
    pub effects: Vec<Effect>,
    /// Set when the event was refused
    pub rejected: Option<Rejection>,
}

/// One conversation, alive for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    messages: Vec<Message>,
    status: TurnStatus,
    language: Language,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::persona::GREETING, Language::default())
    }
}

impl Session {
    /// Start a session with the assistant's greeting
    #[must_use]
    pub fn new(greeting: impl Into<String>, language: Language) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            status: TurnStatus::Idle,
            language,
        }
    }

    /// Conversation log, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current turn status
    #[must_use]
    pub const fn status(&self) -> TurnStatus {
        self.status
    }

    /// Selected speech locale
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Whether the mic control accepts presses
    #[must_use]
    pub fn mic_enabled(&self) -> bool {
        self.status != TurnStatus::Processing
    }

    /// Whether the language selector accepts changes
    #[must_use]
    pub fn language_selectable(&self) -> bool {
        self.status == TurnStatus::Idle
    }

    /// Apply one event
    #[must_use]
    pub fn apply(mut self, event: Event) -> Transition {
        let mut effects = Vec::new();
        let mut rejected = None;

        match event {
            Event::MicToggled => match self.status {
                TurnStatus::Listening => effects.push(Effect::StopListening),
                TurnStatus::Processing => rejected = Some(Rejection::MicDisabled),
                TurnStatus::Idle | TurnStatus::Speaking => {
                    effects.push(Effect::Interrupt);
                    effects.push(Effect::StartListening);
                }
            },
            Event::LanguageSelected(language) => {
                if self.language_selectable() {
                    self.language = language;
                    effects.push(Effect::SetLanguage(language));
                } else {
                    rejected = Some(Rejection::LanguageLocked);
                }
            }
            Event::ListenStarted => {
                if matches!(self.status, TurnStatus::Idle | TurnStatus::Speaking) {
                    self.status = TurnStatus::Listening;
                }
            }
            Event::ListenStopped => {
                if self.status == TurnStatus::Listening {
                    self.status = TurnStatus::Idle;
                }
            }
            Event::Transcript(transcript) => {
                if self.status == TurnStatus::Listening {
                    if transcript.trim().is_empty() {
                        self.status = TurnStatus::Idle;
                    } else {
                        self.messages.push(Message::user(transcript.clone()));
                        effects.push(Effect::Generate {
                            prompt: transcript,
                            history: self.messages.clone(),
                        });
                        self.status = TurnStatus::Processing;
                    }
                }
            }
            Event::ResponseReady(text) => {
                self.messages.push(Message::assistant(text.clone()));
                if self.status != TurnStatus::Listening {
                    effects.push(Effect::Speak(text));
                }
            }
            Event::SpeakStarted => {
                if matches!(self.status, TurnStatus::Processing | TurnStatus::Idle) {
                    self.status = TurnStatus::Speaking;
                }
            }
            Event::SpeakEnded => {
                let reply_pending_playback = self.status == TurnStatus::Processing
                    && self
                        .messages
                        .last()
                        .is_some_and(|m| m.role() == Role::Assistant);
                if self.status == TurnStatus::Speaking || reply_pending_playback {
                    self.status = TurnStatus::Idle;
                }
            }
        }

        Transition {
            session: self,
            effects,
            rejected,
        }
    }
}
