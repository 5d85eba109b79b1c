//! Speech engines backed by local audio devices and cloud speech APIs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::capture::{AudioCapture, SAMPLE_RATE, input_available, samples_to_wav};
use super::endpoint::{Endpoint, UtteranceEndpointer};
use super::playback::{AudioPlayback, decode_mp3, output_available};
use super::{
    EngineEvent, EngineSink, Recognizer, SpeechToText, Synthesizer, TextToSpeech, UtteranceId,
};
use crate::{Error, Language, Result};

/// How often captured audio is fed to the endpointer
const CAPTURE_POLL: Duration = Duration::from_millis(100);

/// Microphone + endpointing + Whisper transcription
pub struct CloudRecognizer {
    stt: Arc<SpeechToText>,
    sink: EngineSink,
    stop: Option<Arc<AtomicBool>>,
}

impl CloudRecognizer {
    /// Create a recognizer reporting to `sink`
    #[must_use]
    pub const fn new(stt: Arc<SpeechToText>, sink: EngineSink) -> Self {
        Self {
            stt,
            sink,
            stop: None,
        }
    }
}

impl Recognizer for CloudRecognizer {
    fn available(&self) -> bool {
        input_available()
    }

    fn start(&mut self, language: Language) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Audio(format!("recognition needs an async runtime: {e}")))?;

        let stop = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self.stop.replace(Arc::clone(&stop)) {
            previous.store(true, Ordering::Relaxed);
        }

        runtime.spawn(listen(
            Arc::clone(&self.stt),
            self.sink.clone(),
            stop,
            language,
        ));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
    }
}

/// One listening session: capture, then transcribe
async fn listen(
    stt: Arc<SpeechToText>,
    sink: EngineSink,
    stop: Arc<AtomicBool>,
    language: Language,
) {
    let capture_sink = sink.clone();
    let captured =
        tokio::task::spawn_blocking(move || capture_utterance(&capture_sink, &stop)).await;

    match captured {
        Ok(Ok(Some(samples))) => {
            let transcript = match samples_to_wav(&samples, SAMPLE_RATE) {
                Ok(wav) => stt.transcribe(wav, language).await,
                Err(e) => Err(e),
            };
            match transcript {
                Ok(text) => sink.send(EngineEvent::Transcript(text)),
                Err(e) => sink.send(EngineEvent::ListenError(e.to_string())),
            }
        }
        Ok(Ok(None)) => tracing::debug!("listening session ended without speech"),
        Ok(Err(e)) => sink.send(EngineEvent::ListenError(e.to_string())),
        Err(e) => sink.send(EngineEvent::ListenError(format!("capture task failed: {e}"))),
    }

    sink.send(EngineEvent::ListenEnded);
}

/// Record until the endpointer closes the utterance or `stop` is set
fn capture_utterance(sink: &EngineSink, stop: &AtomicBool) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;
    sink.send(EngineEvent::ListenStarted);

    let mut endpointer = UtteranceEndpointer::new();
    loop {
        std::thread::sleep(CAPTURE_POLL);
        match endpointer.push(&capture.take_buffer()) {
            Endpoint::Pending => {}
            Endpoint::Complete => break,
            Endpoint::NoSpeech => {
                capture.stop();
                return Ok(None);
            }
        }
        if stop.load(Ordering::Relaxed) {
            tracing::debug!(heard_speech = endpointer.has_speech(), "listening stopped early");
            break;
        }
    }

    capture.stop();
    Ok(endpointer.into_utterance())
}

/// `OpenAI` TTS + speaker playback
pub struct CloudSynthesizer {
    tts: Arc<TextToSpeech>,
    sink: EngineSink,
    cancel: Arc<AtomicBool>,
}

impl CloudSynthesizer {
    /// Create a synthesizer reporting to `sink`
    #[must_use]
    pub fn new(tts: Arc<TextToSpeech>, sink: EngineSink) -> Self {
        Self {
            tts,
            sink,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Synthesizer for CloudSynthesizer {
    fn available(&self) -> bool {
        output_available()
    }

    fn speak(&mut self, id: UtteranceId, text: &str, language: Language) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Tts(format!("synthesis needs an async runtime: {e}")))?;

        self.cancel();
        self.cancel = Arc::new(AtomicBool::new(false));

        tracing::debug!(utterance = id.get(), language = %language, "speaking");
        runtime.spawn(say(
            Arc::clone(&self.tts),
            self.sink.clone(),
            id,
            text.to_string(),
            Arc::clone(&self.cancel),
        ));
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Synthesize one utterance and play it
async fn say(
    tts: Arc<TextToSpeech>,
    sink: EngineSink,
    id: UtteranceId,
    text: String,
    cancel: Arc<AtomicBool>,
) {
    let audio = match tts.synthesize(&text).await {
        Ok(audio) => audio,
        Err(e) => {
            sink.send(EngineEvent::SpeakError(id, e.to_string()));
            return;
        }
    };

    if cancel.load(Ordering::Relaxed) {
        sink.send(EngineEvent::SpeakEnded(id));
        return;
    }

    let playback_sink = sink.clone();
    let played = tokio::task::spawn_blocking(move || {
        let samples = decode_mp3(&audio)?;
        let playback = AudioPlayback::new()?;
        playback_sink.send(EngineEvent::SpeakStarted(id));
        playback.play(samples, &cancel)
    })
    .await;

    match played {
        Ok(Ok(())) => sink.send(EngineEvent::SpeakEnded(id)),
        Ok(Err(e)) => sink.send(EngineEvent::SpeakError(id, e.to_string())),
        Err(e) => sink.send(EngineEvent::SpeakError(id, format!("playback task failed: {e}"))),
    }
}
