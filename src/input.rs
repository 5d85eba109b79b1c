//! Terminal input
//!
//! Maps one line of stdin to what the conversation should do with it,
//! given the current turn status.

use crate::Language;
use crate::conversation::TurnStatus;
use crate::coordinator::Command;
use crate::voice::scripted::{Delivery, TranscriptQueue};

/// Shown when text is typed while a reply is being generated
pub const BUSY_NOTICE: &str = "Still thinking, try again once the reply is ready.";

/// Shown when text is typed without `--text`
pub const TYPE_HINT: &str = "Press Enter to talk (run with --text to type)";

/// Outcome of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send to the coordinator
    Command(Command),
    /// Print the language list
    ListLanguages,
    /// Print a message; nothing else happens
    Notice(String),
    /// Handled already (a transcript reached the open session)
    Nothing,
}

/// Interpret `line` typed while the session is in `status`
///
/// `transcripts` is present in text mode, where any other line is spoken
/// text. It is queued and the mic toggled when a new listening session
/// would start, handed to the open session while listening, and refused
/// while processing.
#[must_use]
pub fn interpret(line: &str, status: TurnStatus, transcripts: Option<&TranscriptQueue>) -> Input {
    match line.trim() {
        "" => Input::Command(Command::ToggleMic),
        "/quit" => Input::Command(Command::Quit),
        "/langs" => Input::ListLanguages,
        other => {
            if let Some(tag) = other.strip_prefix("/lang ") {
                return match tag.trim().parse::<Language>() {
                    Ok(language) => Input::Command(Command::SelectLanguage(language)),
                    Err(e) => Input::Notice(e.to_string()),
                };
            }

            let Some(queue) = transcripts else {
                return Input::Notice(TYPE_HINT.to_string());
            };
            if status == TurnStatus::Processing {
                return Input::Notice(BUSY_NOTICE.to_string());
            }

            match queue.push_transcript(line) {
                Delivery::Live => Input::Nothing,
                Delivery::Queued => Input::Command(Command::ToggleMic),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::scripted::ScriptedRecognizer;
    use crate::voice::{Recognizer, engine_channel};

    #[test]
    fn test_controls() {
        assert_eq!(
            interpret("", TurnStatus::Idle, None),
            Input::Command(Command::ToggleMic)
        );
        assert_eq!(
            interpret(" /quit ", TurnStatus::Speaking, None),
            Input::Command(Command::Quit)
        );
        assert_eq!(interpret("/langs", TurnStatus::Idle, None), Input::ListLanguages);
        assert_eq!(
            interpret("/lang fr-fr", TurnStatus::Idle, None),
            Input::Command(Command::SelectLanguage(Language::FrFr))
        );
        assert!(matches!(
            interpret("/lang xx-XX", TurnStatus::Idle, None),
            Input::Notice(_)
        ));
    }

    #[test]
    fn test_text_without_text_mode() {
        assert_eq!(
            interpret("hello", TurnStatus::Idle, None),
            Input::Notice(TYPE_HINT.to_string())
        );
    }

    #[test]
    fn test_text_while_idle_starts_a_turn() {
        let queue = TranscriptQueue::default();
        assert_eq!(
            interpret("hello", TurnStatus::Idle, Some(&queue)),
            Input::Command(Command::ToggleMic)
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_text_while_speaking_barges_in() {
        let queue = TranscriptQueue::default();
        assert_eq!(
            interpret("stop, one more question", TurnStatus::Speaking, Some(&queue)),
            Input::Command(Command::ToggleMic)
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_text_while_processing_is_refused() {
        let queue = TranscriptQueue::default();
        assert_eq!(
            interpret("hello?", TurnStatus::Processing, Some(&queue)),
            Input::Notice(BUSY_NOTICE.to_string())
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_text_while_listening_goes_to_open_session() {
        let (sink, _events) = engine_channel();
        let queue = TranscriptQueue::default();
        let mut recognizer = ScriptedRecognizer::new(sink, queue.clone());
        recognizer.start(Language::EnUs).unwrap();

        assert_eq!(
            interpret("what is the range?", TurnStatus::Listening, Some(&queue)),
            Input::Nothing
        );
        assert!(queue.is_empty());
        assert!(!queue.is_waiting());
    }
}
