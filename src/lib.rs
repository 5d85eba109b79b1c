//! Revolt Voice - spoken chat assistant for Revolt Motors
//!
//! This library provides the pieces of a push-to-talk voice assistant:
//! - Speech I/O (microphone capture, endpointing, STT, TTS, playback)
//! - Conversation state machine and its coordinator
//! - Response generation via Google Gemini
//! - Terminal presentation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Presentation (render)                │
//! └────────────────────┬────────────────────────────────┘
//!                      │ commands / frames
//! ┌────────────────────▼────────────────────────────────┐
//! │        Coordinator  ──  Session (pure transitions)   │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐       ┌──────────▼────────────┐
//! │   Speech adapter    │       │  Response generator   │
//! │  STT  │  TTS        │       │  Gemini               │
//! └─────────────────────┘       └───────────────────────┘
//! ```

pub mod config;
pub mod conversation;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod input;
pub mod language;
pub mod persona;
pub mod render;
pub mod voice;

pub use config::Config;
pub use conversation::{Message, Role, Session, TurnStatus};
pub use coordinator::{Command, Coordinator};
pub use error::{Error, Result};
pub use generator::{GeminiClient, Generation, ResponseGenerator, generate_response};
pub use language::Language;
pub use persona::Persona;
pub use voice::SpeechAdapter;
