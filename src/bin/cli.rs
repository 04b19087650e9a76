//! CLI binary for sensevox.

use clap::{Parser, Subcommand};
use sensevox::audio::{AudioSink, CpalCapture, CpalPlayback, PcmBuffer, PushToTalk};
use sensevox::dialogue::{Action, Direction, StickEvent, StickHandler, shared_sink};
use sensevox::display::handler::shared;
use sensevox::display::matrix::play_burst;
use sensevox::display::{Burst, DisplayHandle, DisplayHandler, Frame, Rgb, TerminalMatrix, palette};
use sensevox::{SenseConfig, SenseError, Slot};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);
const YELLOW: Rgb = Rgb::new(255, 255, 0);
const WHITE: Rgb = Rgb::new(255, 255, 255);

/// sensevox: push-to-talk voice assistant for an 8x8 LED matrix.
#[derive(Parser)]
#[command(name = "sensevox", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Drive the terminal matrix from stdin: u, d, l, r or m then Enter.
    Display,

    /// Record on Enter, stop on the next Enter, then play it back.
    Echo,

    /// List available audio devices.
    Devices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sensevox=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => SenseConfig::from_file(path)?,
        None => SenseConfig::default(),
    };

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    match cli.command {
        Command::Display => run_display(config, cancel).await,
        Command::Echo => run_echo(config, cancel).await,
        Command::Devices => list_devices(),
    }
}

fn violet_grid() -> Burst {
    Frame::filled_grid(palette::named("violet").unwrap_or(WHITE)).into()
}

fn rgb_grids() -> anyhow::Result<Burst> {
    Ok(Burst::animation(
        [RED, GREEN, BLUE].into_iter().map(Frame::filled_grid).collect(),
    )?)
}

fn warning_flats() -> anyhow::Result<Burst> {
    Ok(Burst::animation(
        [YELLOW, Rgb::BLACK, RED].into_iter().map(Frame::filled).collect(),
    )?)
}

async fn run_display(config: SenseConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let interval = config.display.frame_interval();
    let text_colour = palette::named(&config.display.text_colour).unwrap_or(WHITE);

    let mut terminal = TerminalMatrix::stdout();
    let samples = [
        violet_grid(),
        Frame::filled(WHITE).into(),
        rgb_grids()?,
        warning_flats()?,
    ];
    for burst in &samples {
        play_burst(&mut terminal, burst, interval).await?;
    }

    let handler = DisplayHandler::new(shared(terminal), interval);
    let handle = handler.handle();

    eprintln!("u: violet  d: text  l: rgb  r: warning  m: toggle  (Ctrl+C quits)");
    let bursts = (rgb_grids()?, warning_flats()?);
    std::thread::Builder::new()
        .name("sensevox-stick".into())
        .spawn(move || stick_from_stdin(&handle, text_colour, bursts))?;

    handler.run(cancel).await?;
    Ok(())
}

/// Map stdin lines to display requests, the way joystick presses would.
fn stick_from_stdin(handle: &DisplayHandle, text_colour: Rgb, bursts: (Burst, Burst)) {
    let (rgb, warning) = bursts;
    let mut lit = false;
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "u" => {
                handle.show(violet_grid());
            }
            "d" => {
                handle.show_text("HKU", text_colour);
            }
            "l" => {
                handle.show(rgb.clone());
            }
            "r" => {
                handle.show(warning.clone());
            }
            "m" => {
                lit = !lit;
                let colour = if lit { WHITE } else { Rgb::BLACK };
                handle.show(Frame::filled(colour).into());
            }
            other => warn!(input = other, "unknown key"),
        }
    }
}

async fn run_echo(config: SenseConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let capture = CpalCapture::new(&config.audio)?;
    let sink = shared_sink(CpalPlayback::new(&config.audio)?);
    let utterances: Slot<PcmBuffer> = Slot::new();

    let mut stick = StickHandler::new(PushToTalk::new(capture), utterances.clone());
    let recording = stick.recording_indicator();
    std::thread::Builder::new()
        .name("sensevox-stick".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                let action = if recording.load(std::sync::atomic::Ordering::Acquire) {
                    Action::Released
                } else {
                    Action::Pressed
                };
                if let Err(e) = stick.handle(StickEvent::new(action, Direction::Up)) {
                    warn!("joystick event failed: {e}");
                }
            }
        })?;

    eprintln!("Press Enter to start recording, Enter again to stop. Ctrl+C quits.");
    while let Some(pcm) = utterances.consume(&cancel).await {
        info!(seconds = pcm.duration().as_secs_f32(), "playing back");
        let sink = Arc::clone(&sink);
        let played = tokio::task::spawn_blocking(move || {
            let mut sink = sink
                .lock()
                .map_err(|e| SenseError::Audio(format!("sink lock poisoned: {e}")))?;
            sink.play(&pcm)
        })
        .await?;
        if let Err(e) = played {
            warn!("playback failed: {e}");
        }
    }
    Ok(())
}

fn list_devices() -> anyhow::Result<()> {
    println!("Input devices:");
    for name in CpalCapture::list_input_devices()? {
        println!("  - {name}");
    }

    println!("\nOutput devices:");
    for name in CpalPlayback::list_output_devices()? {
        println!("  - {name}");
    }

    Ok(())
}
