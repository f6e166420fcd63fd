use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use aloud_audio::{AudioBackend, StreamPlayer};
use aloud_core::{SessionEvent, TtsConfig, VoiceSettings, fetch_speech, stream_speech};
use clap::Parser;
use config::{PathManager, Settings, load_env_file};
use tokio::sync::mpsc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "aloud", about = "Streaming text-to-speech client")]
struct Args {
    /// Voice to synthesize with (overrides settings)
    #[arg(long)]
    voice: Option<String>,

    /// TTS model id (overrides settings)
    #[arg(long)]
    model: Option<String>,

    /// Seconds between input flushes (overrides settings)
    #[arg(long)]
    flush_interval: Option<u64>,

    /// Download each utterance as one clip instead of streaming it
    #[arg(long)]
    one_shot: bool,

    #[arg(long, short)]
    tracing: bool,
}

fn setup_tracing(enable: bool) {
    if enable {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Setting default subscriber failed");
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::ERROR)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Setting default subscriber failed");
    }
}

/// Forward one utterance to the service, feeding audio into the player.
async fn speak(
    cfg: &TtsConfig,
    player: &StreamPlayer,
    text: String,
    one_shot: bool,
) -> anyhow::Result<()> {
    if one_shot {
        let clip = fetch_speech(cfg, &text).await?;
        player.append(clip);
        return Ok(());
    }

    // The websocket connect blocks; keep it off the runtime threads.
    let session_cfg = cfg.clone();
    let mut events =
        tokio::task::spawn_blocking(move || stream_speech(&session_cfg, &text)).await??;

    let player = player.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Audio(audio) => player.append(audio),
                SessionEvent::Final | SessionEvent::Closed => break,
                SessionEvent::Error(e) => {
                    eprintln!("Session error: {}", e);
                    break;
                }
            }
        }
    });

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();

    setup_tracing(args.tracing);

    if let Err(e) = PathManager::ensure_dirs_exist() {
        eprintln!("Warning: could not create config directory: {}", e);
    }
    let settings = Settings::load();

    let Some(api_key) = settings.resolve_api_key() else {
        anyhow::bail!(
            "No API key configured; set ELEVENLABS_API_KEY or api_key in settings.toml"
        );
    };

    let cfg = TtsConfig {
        api_key,
        voice_id: args.voice.unwrap_or_else(|| settings.voice_id.clone()),
        model_id: args.model.unwrap_or_else(|| settings.model_id.clone()),
        voice_settings: VoiceSettings {
            stability: settings.stability,
            similarity_boost: settings.similarity_boost,
        },
    };
    let flush_interval = args
        .flush_interval
        .unwrap_or(settings.flush_interval_secs)
        .max(1);

    let backend = Arc::new(AudioBackend::new()?);
    let player = StreamPlayer::new(backend);

    // stdin reader on its own thread; lines arrive over a channel.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!(
        "Type text to speak; it is sent every {}s. /stop halts playback, Ctrl+D exits.",
        flush_interval
    );

    let mut status = player.watch();
    let mut pending = String::new();
    let mut flush = tokio::time::interval(Duration::from_secs(flush_interval));
    flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut input_open = true;

    loop {
        tokio::select! {
            line = line_rx.recv(), if input_open => {
                match line {
                    Some(line) => {
                        let line = line.trim();
                        if line == "/stop" {
                            player.stop();
                            pending.clear();
                        } else if !line.is_empty() {
                            if !pending.is_empty() {
                                pending.push(' ');
                            }
                            pending.push_str(line);
                        }
                    }
                    None => input_open = false,
                }
            }
            _ = flush.tick() => {
                if !pending.is_empty() {
                    let text = std::mem::take(&mut pending);
                    if let Err(e) = speak(&cfg, &player, text, args.one_shot).await {
                        eprintln!("Error: {:#}", e);
                    }
                } else if !input_open && !player.is_playing() {
                    break;
                }
            }
            _ = status.changed() => {
                if *status.borrow_and_update() {
                    println!("▶ speaking");
                } else {
                    println!("■ idle");
                }
            }
        }
    }

    Ok(())
}
