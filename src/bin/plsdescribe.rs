//! `plsdescribe`: describe a plot image with Gemini.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line.
//! 3. Load [`AppConfig`] (defaults are written on first run).
//! 4. Run the description stage; map failures to distinct exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use plsdescribe::config::AppConfig;
use plsdescribe::describe::{self, DescribeOptions, Verbosity};

/// Describe a data-visualization plot for accessibility.
#[derive(Debug, Parser)]
#[command(name = "plsdescribe", version, about)]
struct Cli {
    /// Image to describe.
    #[arg(short = 'i', long)]
    image: PathBuf,

    /// Increase verbosity: -v for bullet points in SSML.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// A question to append to the prompt.
    #[arg(long)]
    question: Option<String>,

    /// Output file for the description [default: from settings, description.txt].
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Speak the description aloud instead of printing it.
    #[arg(long)]
    speak: bool,

    /// Enter an interactive session for follow-up questions.
    #[arg(long)]
    interactive: bool,

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

    // No -v is level 1; each -v adds one.
    let level = cli.verbose.saturating_add(1);

    let options = DescribeOptions {
        image: cli.image,
        verbosity: Verbosity::from_level(level),
        question: cli.question,
        output: cli
            .output
            .unwrap_or_else(|| config.describer.output_path.clone()),
        speak: cli.speak,
        interactive: cli.interactive,
    };

    match describe::run(&options, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
