//! Interactive follow-up session.
//!
//! After the first description the user can keep asking about the same
//! image.  Each line read from the input is parsed into a
//! [`SessionCommand`]:
//!
//! | Input             | Effect                                        |
//! |-------------------|-----------------------------------------------|
//! | `/quit` `/q` `/exit` | leave the session                          |
//! | `/tts`            | speak the last response                       |
//! | `/save [file]`    | write the last response (default: output path) |
//! | `/help` `/?`      | list commands                                 |
//! | `<question> /tts` | ask and speak the answer                      |
//! | anything else     | ask and print the answer                      |
//!
//! Prompts and notices go to stderr so stdout carries only answers.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::describer::Describer;
use super::input::ImageInput;
use super::DescribeError;
use crate::artifact;
use crate::speech::Speaker;

const HELP: &str = "\
Commands:
  /tts              Speak the last response
  <question> /tts   Ask a question and speak the answer
  /save [file]      Save last response to file
  /quit             Exit interactive mode
  /help             Show this help
Anything else is sent as a follow-up question about the image.";

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Empty,
    Quit,
    Speak,
    Save(Option<PathBuf>),
    Help,
    Ask { question: String, speak: bool },
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => return Self::Empty,
            "/quit" | "/q" | "/exit" => return Self::Quit,
            "/tts" => return Self::Speak,
            "/help" | "/?" => return Self::Help,
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("/save") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let file = rest.trim();
                return Self::Save((!file.is_empty()).then(|| PathBuf::from(file)));
            }
        }

        match line.strip_suffix("/tts") {
            Some(question) if !question.trim().is_empty() => Self::Ask {
                question: question.trim().to_string(),
                speak: true,
            },
            _ => Self::Ask {
                question: line.to_string(),
                speak: false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Follow-up loop over one image.
pub struct Session<'a> {
    describer: &'a Describer,
    image: &'a ImageInput,
    speaker: Option<&'a Speaker>,
    default_save_path: PathBuf,
    last_response: String,
}

impl<'a> Session<'a> {
    pub fn new(
        describer: &'a Describer,
        image: &'a ImageInput,
        speaker: Option<&'a Speaker>,
        default_save_path: PathBuf,
        first_response: String,
    ) -> Self {
        Self {
            describer,
            image,
            speaker,
            default_save_path,
            last_response: first_response,
        }
    }

    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    /// Read commands from `reader` until `/quit` or end of input.
    pub async fn run<R>(&mut self, reader: R) -> Result<(), DescribeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        eprintln!("\nInteractive mode. Commands: /tts, /save [file], /quit");
        eprint!("> ");

        while let Some(line) = lines.next_line().await.map_err(DescribeError::Session)? {
            match SessionCommand::parse(&line) {
                SessionCommand::Empty => {}
                SessionCommand::Quit => return Ok(()),
                SessionCommand::Help => eprintln!("{HELP}"),
                SessionCommand::Speak => self.speak_last().await,
                SessionCommand::Save(path) => {
                    let path = path.unwrap_or_else(|| self.default_save_path.clone());
                    match artifact::write_description(&path, &self.last_response) {
                        Ok(()) => eprintln!("Saved to {}", path.display()),
                        Err(e) => eprintln!("Error saving: {e}"),
                    }
                }
                SessionCommand::Ask { question, speak } => {
                    match self
                        .describer
                        .follow_up(self.image, &self.last_response, &question)
                        .await
                    {
                        Ok(answer) => {
                            self.last_response = answer.text;
                            if speak {
                                self.speak_last().await;
                            } else {
                                println!("{}", self.last_response);
                            }
                        }
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
            }
            eprint!("> ");
        }

        Ok(())
    }

    async fn speak_last(&self) {
        let Some(speaker) = self.speaker else {
            eprintln!("TTS is not available in this session");
            return;
        };
        speaker.speak_reported(&self.last_response).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
