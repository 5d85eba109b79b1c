use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use revolt_voice::coordinator::{self, Coordinator};
use revolt_voice::input::{self, Input};
use revolt_voice::render;
use revolt_voice::voice::scripted::{
    PlaybackMode, ScriptedRecognizer, ScriptedSynthesizer, SpeechLog, TranscriptQueue,
};
use revolt_voice::voice::{
    AudioCapture, AudioPlayback, CloudRecognizer, CloudSynthesizer, PLAYBACK_SAMPLE_RATE,
    SpeechAdapter, SpeechToText, TextToSpeech, engine_channel,
};
use revolt_voice::{Config, GeminiClient, Language, Session, TurnStatus, generate_response};

/// Revolt Voice - talk to the Revolt Motors assistant
#[derive(Parser)]
#[command(name = "revolt-voice", version, about)]
struct Cli {
    /// Speech language (e.g. "en-GB"); overrides the configured default
    #[arg(short, long)]
    lang: Option<Language>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Type instead of speaking; replies are shown, not played
    #[arg(long)]
    text: bool,

    /// Disable voice features (implies --text)
    #[arg(long, env = "REVOLT_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the reply
    Ask {
        /// Question text
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// List supported languages
    Languages,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,revolt_voice=info",
        1 => "info,revolt_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { prompt } => ask(cli.disable_voice, &prompt.join(" ")).await,
            Command::Languages => {
                println!("{}", render::language_list());
                Ok(())
            }
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
        };
    }

    // Missing credentials end the run before anything is shown
    let config = Config::load(cli.disable_voice)?;
    tracing::debug!(?config, "loaded configuration");

    let language = cli.lang.unwrap_or(config.language);
    let text_mode = cli.text || !config.voice.enabled;

    tracing::info!(
        model = %config.llm.model,
        language = %language,
        text_mode,
        "starting revolt voice"
    );

    let generator = GeminiClient::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.persona.system_instruction.clone(),
    )?
    .with_base_url(config.llm.base_url.clone());

    let (adapter, transcripts) = if text_mode {
        let (adapter, queue) = scripted_adapter();
        (Some(adapter), Some(queue))
    } else {
        (cloud_adapter(&config)?, None)
    };

    let adapter = match render::speech_or_unsupported(adapter) {
        Ok(adapter) => adapter,
        Err(message) => {
            println!("{message}");
            return Ok(());
        }
    };

    println!("{}", config.persona.name);
    let session = Session::new(config.persona.greeting.clone(), language);
    let coordinator = Coordinator::new(session, adapter, Arc::new(generator));

    let (commands_tx, commands_rx) = mpsc::channel(16);

    let ctrl_c_tx = commands_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(coordinator::Command::Quit).await;
        }
    });
    let (status_tx, status_rx) = watch::channel(TurnStatus::Idle);
    tokio::spawn(read_input(commands_tx, status_rx, transcripts));

    let mut last_frame = String::new();
    coordinator
        .run(commands_rx, move |session, rejection| {
            status_tx.send_replace(session.status());
            if let Some(rejection) = rejection {
                println!("{}", render::rejection_text(rejection));
            }
            let frame = render::frame(session);
            if frame != last_frame {
                println!("\n{frame}");
                last_frame = frame;
            }
        })
        .await;

    Ok(())
}

/// Engines for `--text`: typed lines are transcripts, replies are shown only
fn scripted_adapter() -> (SpeechAdapter, TranscriptQueue) {
    let (sink, events) = engine_channel();
    let queue = TranscriptQueue::default();
    let recognizer = ScriptedRecognizer::new(sink.clone(), queue.clone());
    let synthesizer = ScriptedSynthesizer::new(sink, SpeechLog::default(), PlaybackMode::Complete);
    (
        SpeechAdapter::new(Box::new(recognizer), Box::new(synthesizer), events),
        queue,
    )
}

/// Microphone and speaker engines; `None` without a speech API key
fn cloud_adapter(config: &Config) -> anyhow::Result<Option<SpeechAdapter>> {
    let Some(key) = config.voice.api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY not set, speech unavailable");
        return Ok(None);
    };

    let stt = SpeechToText::new(
        key.clone(),
        config.voice.stt_model.clone(),
        config.voice.base_url.clone(),
    )?;
    let tts = TextToSpeech::new(
        key,
        config.voice.tts_model.clone(),
        config.voice.tts_voice.clone(),
        config.voice.tts_speed,
        config.voice.base_url.clone(),
    )?;

    let (sink, events) = engine_channel();
    let recognizer = CloudRecognizer::new(Arc::new(stt), sink.clone());
    let synthesizer = CloudSynthesizer::new(Arc::new(tts), sink);
    Ok(Some(SpeechAdapter::new(
        Box::new(recognizer),
        Box::new(synthesizer),
        events,
    )))
}

/// Turn stdin lines into coordinator commands
async fn read_input(
    commands: mpsc::Sender<coordinator::Command>,
    status: watch::Receiver<TurnStatus>,
    transcripts: Option<TranscriptQueue>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                break;
            }
        };

        let current = *status.borrow();
        let command = match input::interpret(&line, current, transcripts.as_ref()) {
            Input::Command(command) => command,
            Input::ListLanguages => {
                println!("{}", render::language_list());
                continue;
            }
            Input::Notice(notice) => {
                println!("{notice}");
                continue;
            }
            Input::Nothing => continue,
        };

        if commands.send(command).await.is_err() {
            return;
        }
    }

    let _ = commands.send(coordinator::Command::Quit).await;
}

/// One-shot generation
async fn ask(disable_voice: bool, prompt: &str) -> anyhow::Result<()> {
    let config = Config::load(disable_voice)?;
    let generator = GeminiClient::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.persona.system_instruction.clone(),
    )?
    .with_base_url(config.llm.base_url);

    println!("{}", generate_response(&generator, prompt, &[]).await);
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If the meter moved while you spoke, voice input will work.");
    println!("If RMS stayed near 0, check the default input device and its level.");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (PLAYBACK_SAMPLE_RATE as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!(
        "Playing {} samples at {} Hz...",
        samples.len(),
        PLAYBACK_SAMPLE_RATE
    );

    tokio::task::spawn_blocking(move || {
        let playback = AudioPlayback::new()?;
        playback.play(samples, &AtomicBool::new(false))
    })
    .await??;

    println!("\n---");
    println!("If you heard the tone, replies will be audible.");
    println!("If not, check the default output device and its volume.");

    Ok(())
}
