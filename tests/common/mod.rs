//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use revolt_voice::conversation::Message;
use revolt_voice::input::{self, Input};
use revolt_voice::voice::engine_channel;
use revolt_voice::voice::scripted::{
    PlaybackMode, ScriptedRecognizer, ScriptedSynthesizer, SpeechLog, TranscriptQueue,
};
use revolt_voice::{Command, Coordinator, Generation, ResponseGenerator, Session, SpeechAdapter};

/// One recorded generation request
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub prompt: String,
    pub history: Vec<Message>,
}

#[derive(Default)]
struct StubInner {
    replies: VecDeque<Generation>,
    calls: Vec<GenerateCall>,
}

/// Generator that returns queued results and records its inputs
///
/// With nothing queued it fails, so the coordinator falls back.
#[derive(Clone, Default)]
pub struct StubGenerator(Arc<Mutex<StubInner>>);

impl StubGenerator {
    pub fn reply(self, text: &str) -> Self {
        self.0
            .lock()
            .unwrap()
            .replies
            .push_back(Generation::Reply(text.to_string()));
        self
    }

    pub fn fail(self, reason: &str) -> Self {
        self.0
            .lock()
            .unwrap()
            .replies
            .push_back(Generation::Failed(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.0.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ResponseGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, history: &[Message]) -> Generation {
        let mut inner = self.0.lock().unwrap();
        inner.calls.push(GenerateCall {
            prompt: prompt.to_string(),
            history: history.to_vec(),
        });
        inner
            .replies
            .pop_front()
            .unwrap_or_else(|| Generation::Failed("no reply queued".to_string()))
    }
}

/// Coordinator wired to scripted speech engines
pub struct Harness {
    pub coordinator: Coordinator,
    pub transcripts: TranscriptQueue,
    pub speech: SpeechLog,
    pub generator: StubGenerator,
}

impl Harness {
    pub fn new(generator: StubGenerator, mode: PlaybackMode) -> Self {
        let (sink, events) = engine_channel();
        let transcripts = TranscriptQueue::default();
        let speech = SpeechLog::default();
        let adapter = SpeechAdapter::new(
            Box::new(ScriptedRecognizer::new(sink.clone(), transcripts.clone())),
            Box::new(ScriptedSynthesizer::new(sink, speech.clone(), mode)),
            events,
        );
        let coordinator =
            Coordinator::new(Session::default(), adapter, Arc::new(generator.clone()));

        Self {
            coordinator,
            transcripts,
            speech,
            generator,
        }
    }

    pub fn session(&self) -> &Session {
        self.coordinator.session()
    }

    /// Handle engine events and replies until nothing arrives for a while
    pub async fn settle(&mut self) {
        while tokio::time::timeout(Duration::from_millis(100), self.coordinator.process_next())
            .await
            .is_ok()
        {}
    }

    /// Press the mic and run the resulting turn to completion
    pub async fn say(&mut self, transcript: &str) {
        self.transcripts.push_transcript(transcript);
        self.coordinator.toggle_mic();
        self.settle().await;
    }

    /// Handle a line typed in text mode, as the terminal reader does
    pub async fn type_line(&mut self, line: &str) -> Input {
        let status = self.session().status();
        let input = input::interpret(line, status, Some(&self.transcripts));
        if let Input::Command(command) = &input {
            match command {
                Command::ToggleMic => {
                    self.coordinator.toggle_mic();
                }
                Command::SelectLanguage(language) => {
                    self.coordinator.select_language(*language);
                }
                Command::Quit => {}
            }
        }
        self.settle().await;
        input
    }
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
