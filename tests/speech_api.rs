//! Whisper and TTS client tests against an in-process mock server

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use revolt_voice::Language;
use revolt_voice::voice::{SAMPLE_RATE, SpeechToText, TextToSpeech, samples_to_wav};
use secrecy::SecretString;

mod common;
use common::spawn_server;

#[derive(Debug, Default)]
struct Seen {
    path: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

#[derive(Clone)]
struct Mock {
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
    seen: Arc<Mutex<Seen>>,
}

async fn handle(
    State(mock): State<Mock>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], Bytes) {
    {
        let mut seen = mock.seen.lock().unwrap();
        seen.path = uri.path().to_string();
        seen.authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        seen.body = body.to_vec();
    }
    (mock.status, [("content-type", mock.content_type)], mock.body)
}

async fn mock_api(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let mock = Mock {
        status,
        content_type,
        body: body.into(),
        seen: Arc::clone(&seen),
    };
    let router = Router::new().fallback(handle).with_state(mock);
    (spawn_server(router).await, seen)
}

fn wav() -> Vec<u8> {
    samples_to_wav(&vec![0.0; SAMPLE_RATE as usize / 10], SAMPLE_RATE).unwrap()
}

#[tokio::test]
async fn test_transcribe_sends_language_subtag() {
    let (base, seen) = mock_api(
        StatusCode::OK,
        "application/json",
        r#"{"text": " Bonjour, je voudrais un essai. \n"}"#,
    )
    .await;

    let stt = SpeechToText::new(SecretString::from("sk-test"), "whisper-1".to_string(), base)
        .unwrap();
    let text = stt.transcribe(wav(), Language::FrFr).await.unwrap();
    assert_eq!(text, "Bonjour, je voudrais un essai.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.path, "/audio/transcriptions");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));

    let body = String::from_utf8_lossy(&seen.body);
    assert!(body.contains(r#"name="model""#));
    assert!(body.contains("whisper-1"));
    assert!(body.contains(r#"name="language""#));
    assert!(body.contains("\r\n\r\nfr\r\n"));
    assert!(body.contains(r#"filename="audio.wav""#));
}

#[tokio::test]
async fn test_transcribe_error_status() {
    let (base, _) = mock_api(
        StatusCode::UNAUTHORIZED,
        "application/json",
        r#"{"error": {"message": "bad key"}}"#,
    )
    .await;

    let stt = SpeechToText::new(SecretString::from("sk-test"), "whisper-1".to_string(), base)
        .unwrap();
    let err = stt.transcribe(wav(), Language::EnUs).await.unwrap_err();
    assert!(matches!(err, revolt_voice::Error::Stt(msg) if msg.contains("401")));
}

#[test]
fn test_speech_clients_require_key() {
    assert!(
        SpeechToText::new(
            SecretString::from(""),
            "whisper-1".to_string(),
            "http://localhost".to_string()
        )
        .is_err()
    );
    assert!(
        TextToSpeech::new(
            SecretString::from(" "),
            "tts-1".to_string(),
            "alloy".to_string(),
            1.0,
            "http://localhost".to_string()
        )
        .is_err()
    );
}

#[tokio::test]
async fn test_synthesize_returns_audio_bytes() {
    let audio: &'static [u8] = b"ID3\x04fake-mp3-bytes";
    let (base, seen) = mock_api(StatusCode::OK, "audio/mpeg", audio).await;

    let tts = TextToSpeech::new(
        SecretString::from("sk-test"),
        "tts-1".to_string(),
        "nova".to_string(),
        1.25,
        format!("{base}/"),
    )
    .unwrap();
    let bytes = tts.synthesize("Your test ride is booked.").await.unwrap();
    assert_eq!(bytes, audio);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.path, "/audio/speech");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));

    let request: serde_json::Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(request["model"], "tts-1");
    assert_eq!(request["voice"], "nova");
    assert_eq!(request["input"], "Your test ride is booked.");
    assert_eq!(request["response_format"], "mp3");
    assert_eq!(request["speed"], 1.25);
}

#[tokio::test]
async fn test_synthesize_error_status() {
    let (base, _) = mock_api(StatusCode::TOO_MANY_REQUESTS, "text/plain", "slow down").await;

    let tts = TextToSpeech::new(
        SecretString::from("sk-test"),
        "tts-1".to_string(),
        "alloy".to_string(),
        1.0,
        base,
    )
    .unwrap();
    let err = tts.synthesize("hi").await.unwrap_err();
    assert!(matches!(err, revolt_voice::Error::Tts(msg) if msg.contains("429")));
}
