//! Terminal presentation
//!
//! Pure functions from a [`Session`] to text. Nothing here mutates state.

use std::fmt::Write as _;

use crate::Language;
use crate::conversation::{Rejection, Role, Session, TurnStatus};
use crate::voice::SpeechAdapter;

/// Shown instead of the conversation when speech I/O is unavailable
pub const UNSUPPORTED_MESSAGE: &str = "Speech is not available here. Voice chat needs a \
     microphone, a speaker and an OPENAI_API_KEY for recognition and synthesis. Run with \
     --text to type instead.";

/// Pass a usable adapter through, or give the unsupported message
///
/// `None` means no engines could be built (for example no speech key).
///
/// # Errors
///
/// Returns [`UNSUPPORTED_MESSAGE`] when there is no adapter or it cannot
/// both recognize and synthesize
pub fn speech_or_unsupported(
    adapter: Option<SpeechAdapter>,
) -> Result<SpeechAdapter, &'static str> {
    adapter
        .filter(SpeechAdapter::supported)
        .ok_or(UNSUPPORTED_MESSAGE)
}

/// Input help shown under the conversation
pub const HELP: &str = "[Enter] mic  /lang <tag>  /langs  /quit";

/// Status line for `status`
#[must_use]
pub const fn status_text(status: TurnStatus) -> &'static str {
    match status {
        TurnStatus::Idle => "Press Enter to talk",
        TurnStatus::Listening => "Listening...",
        TurnStatus::Processing => "Thinking...",
        TurnStatus::Speaking => "Speaking...",
    }
}

/// Mic control label for `status`
#[must_use]
pub const fn mic_label(status: TurnStatus) -> &'static str {
    match status {
        TurnStatus::Listening => "[stop]",
        TurnStatus::Processing => "[mic disabled]",
        TurnStatus::Idle | TurnStatus::Speaking => "[mic]",
    }
}

/// Why a control had no effect
#[must_use]
pub const fn rejection_text(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::MicDisabled => "Still thinking, the mic is disabled until the reply is ready.",
        Rejection::LanguageLocked => "The language can only change while idle.",
    }
}

const fn role_marker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "revolt",
    }
}

/// Language selector line; locked outside Idle
#[must_use]
pub fn language_line(session: &Session) -> String {
    let lock = if session.language_selectable() {
        ""
    } else {
        " (locked)"
    };
    format!(
        "Language: {} [{}]{lock}",
        session.language().label(),
        session.language().tag()
    )
}

/// Listing for `/langs`
#[must_use]
pub fn language_list() -> String {
    Language::ALL
        .iter()
        .map(|lang| format!("{:<6} {}", lang.tag(), lang.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full screen for `session`
#[must_use]
pub fn frame(session: &Session) -> String {
    let mut out = String::new();

    for message in session.messages() {
        let _ = writeln!(out, "{:>7}: {}", role_marker(message.role()), message.text());
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", language_line(session));
    let _ = writeln!(
        out,
        "{} {}",
        mic_label(session.status()),
        status_text(session.status())
    );
    let _ = write!(out, "{HELP}");
    out
}
