//! `plsspeak`: read the description artifact aloud.
//!
//! Synthesis and playback failures are logged and the process still exits
//! cleanly after printing `Audio finished.`.  Only a missing description
//! file produces exit code 3; any other read error exits with 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use plsdescribe::artifact::DEFAULT_ARTIFACT_PATH;
use plsdescribe::config::AppConfig;
use plsdescribe::speech::{read_aloud, InputMode, Speaker};

/// Speak the description written by plsdescribe.
#[derive(Debug, Parser)]
#[command(name = "plsspeak", version, about)]
struct Cli {
    /// How the text is submitted [default: from settings, ssml].
    #[arg(long, value_enum)]
    mode: Option<InputMode>,

    /// Description file to read.
    #[arg(long, default_value = DEFAULT_ARTIFACT_PATH)]
    input: PathBuf,

    /// Speaking rate between 0.25 and 2.0.
    #[arg(long)]
    rate: Option<f32>,

    /// Settings file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    config.speaker.apply_env();
    if let Some(mode) = cli.mode {
        config.speaker.mode = mode;
    }
    if cli.rate.is_some() {
        config.speaker.speaking_rate = cli.rate;
    }

    let speaker = match Speaker::from_config(&config.speaker) {
        Ok(speaker) => Some(speaker),
        Err(e) => {
            log::error!("speech unavailable: {e}");
            eprintln!("TTS error: {e}");
            None
        }
    };

    match read_aloud(&cli.input, speaker.as_ref(), &mut std::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
