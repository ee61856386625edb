//! Description stage for plsdescribe.
//!
//! This module provides:
//! * [`PromptBuilder`] / [`Verbosity`]: fixed prompt templates.
//! * [`ImageInput`]: a decoded image plus its MIME type.
//! * [`ApiKey`]: the Gemini credential, passed explicitly to the client.
//! * [`VisionModel`]: async trait implemented by [`GeminiClient`].
//! * [`Describer`]: image + prompt → [`Description`].
//! * [`Session`]: interactive follow-up questions.
//! * [`run`]: the whole `plsdescribe` flow.
//!
//! Credential and image problems are reported before any request is made.

pub mod credential;
pub mod describer;
pub mod input;
pub mod model;
pub mod prompt;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::artifact::{self, ArtifactError};
use crate::config::AppConfig;
use crate::speech::Speaker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use credential::{ApiKey, GEMINI_API_KEY_VAR};
pub use describer::{Describer, Description};
pub use input::ImageInput;
pub use model::{GeminiClient, ModelError, VisionModel};
pub use prompt::{PromptBuilder, Verbosity};
pub use session::{Session, SessionCommand};

// ---------------------------------------------------------------------------
// DescribeError
// ---------------------------------------------------------------------------

/// Everything that can stop the describer, each with its own exit code.
#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),

    #[error("'{}' not found", .0.display())]
    ImageNotFound(PathBuf),

    #[error("failed to read '{}': {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a readable image: {reason}", .path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("model request failed: {0}")]
    Remote(#[from] ModelError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("failed to read interactive input: {0}")]
    Session(#[source] std::io::Error),
}

impl DescribeError {
    /// Process exit code for this failure.
    ///
    /// | Code | Failure                       |
    /// |------|-------------------------------|
    /// | 1    | interactive input             |
    /// | 2    | missing credential            |
    /// | 3    | image not found / unreadable  |
    /// | 4    | image not decodable           |
    /// | 5    | remote model call             |
    /// | 6    | description file write        |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Session(_) => 1,
            Self::MissingCredential(_) => 2,
            Self::ImageNotFound(_) | Self::ImageRead { .. } => 3,
            Self::ImageDecode { .. } => 4,
            Self::Remote(_) => 5,
            Self::Artifact(_) => 6,
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Options for one `plsdescribe` invocation.
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    pub image: PathBuf,
    pub verbosity: Verbosity,
    pub question: Option<String>,
    /// Where the description artifact is written.
    pub output: PathBuf,
    /// Speak the description instead of printing it.
    pub speak: bool,
    /// Enter the follow-up session afterwards.
    pub interactive: bool,
}

/// Describe one image end to end with the Gemini client and the process
/// environment.
pub async fn run(options: &DescribeOptions, config: &AppConfig) -> Result<(), DescribeError> {
    run_with(
        options,
        config,
        |name| std::env::var(name).ok(),
        |key| Arc::new(GeminiClient::new(&config.describer, key)) as Arc<dyn VisionModel>,
    )
    .await
}

/// [`run`] with the credential lookup and the model construction supplied by
/// the caller.
///
/// Order: credential → image → `connect` → model call → artifact → optional
/// speech → optional session.  `connect` is only called once the key and the
/// image are both valid, and nothing is written before the model answers.
/// Speech failures are reported and never fail the run.
pub async fn run_with<L, C>(
    options: &DescribeOptions,
    config: &AppConfig,
    lookup: L,
    connect: C,
) -> Result<(), DescribeError>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(ApiKey) -> Arc<dyn VisionModel>,
{
    let api_key = ApiKey::from_lookup(lookup)?;
    let image = ImageInput::load(&options.image)?;

    let describer = Describer::new(connect(api_key), PromptBuilder::from_config(&config.describer));

    let question = options.question.as_deref();
    println!("{}", describer.prompts().build(options.verbosity, question));

    let description = describer.describe(&image, options.verbosity, question).await?;

    artifact::write_description(&options.output, &description.text)?;

    let speaker = if options.speak || options.interactive {
        match Speaker::from_config(&config.speaker) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("speech unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    // Printing while speaking makes a screen reader talk over the voice.
    match (&speaker, options.speak) {
        (Some(s), true) => {
            s.speak_reported(&description.text).await;
        }
        _ => println!("{}", description.text),
    }

    if options.interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        Session::new(
            &describer,
            &image,
            speaker.as_ref(),
            options.output.clone(),
            description.text,
        )
        .run(stdin)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Answers every prompt with the same text, or fails with a 500.
    struct FixedModel {
        answer: Option<&'static str>,
    }

    #[async_trait]
    impl VisionModel for FixedModel {
        async fn describe(&self, _prompt: &str, _image: &ImageInput) -> Result<String, ModelError> {
            self.answer.map(str::to_string).ok_or(ModelError::Status {
                status: 500,
                body: "internal".into(),
            })
        }
    }

    fn options(image: PathBuf, output: PathBuf) -> DescribeOptions {
        DescribeOptions {
            image,
            verbosity: Verbosity::Concise,
            question: None,
            output,
            speak: false,
            interactive: false,
        }
    }

    fn png(dir: &Path) -> PathBuf {
        let path = dir.join("plot.png");
        image::RgbImage::new(4, 4).save(&path).expect("save png");
        path
    }

    fn with_key(name: &str) -> Option<String> {
        (name == GEMINI_API_KEY_VAR).then(|| "test-key".to_string())
    }

    /// Run with `answer` as the model's reply, counting how often a client is built.
    async fn run_counted(
        options: &DescribeOptions,
        lookup: fn(&str) -> Option<String>,
        answer: Option<&'static str>,
        connects: &AtomicUsize,
    ) -> Result<(), DescribeError> {
        run_with(options, &AppConfig::default(), lookup, |_key| {
            connects.fetch_add(1, Ordering::SeqCst);
            Arc::new(FixedModel { answer }) as Arc<dyn VisionModel>
        })
        .await
    }

    #[tokio::test]
    async fn missing_credential_stops_before_any_client_or_artifact() {
        let dir = tempdir().expect("temp dir");
        let output = dir.path().join("description.txt");
        let opts = options(png(dir.path()), output.clone());
        let connects = AtomicUsize::new(0);

        let err = run_counted(&opts, |_| None, Some("unused"), &connects)
            .await
            .unwrap_err();

        assert!(matches!(err, DescribeError::MissingCredential(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn missing_image_stops_before_any_client_or_artifact() {
        let dir = tempdir().expect("temp dir");
        let output = dir.path().join("description.txt");
        let opts = options(dir.path().join("absent.png"), output.clone());
        let connects = AtomicUsize::new(0);

        let err = run_counted(&opts, with_key, Some("unused"), &connects)
            .await
            .unwrap_err();

        assert!(matches!(err, DescribeError::ImageNotFound(_)));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn undecodable_image_stops_before_any_client() {
        let dir = tempdir().expect("temp dir");
        let image = dir.path().join("plot.png");
        std::fs::write(&image, b"not a png").expect("write");
        let output = dir.path().join("description.txt");
        let connects = AtomicUsize::new(0);

        let err = run_counted(&options(image, output.clone()), with_key, None, &connects)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn remote_failure_writes_no_artifact() {
        let dir = tempdir().expect("temp dir");
        let output = dir.path().join("description.txt");
        let opts = options(png(dir.path()), output.clone());
        let connects = AtomicUsize::new(0);

        let err = run_counted(&opts, with_key, None, &connects).await.unwrap_err();

        assert_eq!(err.exit_code(), 5);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn successful_run_writes_the_answer() {
        let dir = tempdir().expect("temp dir");
        let output = dir.path().join("description.txt");
        let opts = options(png(dir.path()), output.clone());
        let connects = AtomicUsize::new(0);

        run_counted(&opts, with_key, Some("<speak>One cluster.</speak>"), &connects)
            .await
            .expect("run");

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(
            std::fs::read_to_string(&output).expect("read"),
            "<speak>One cluster.</speak>"
        );
    }

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let errors = [
            DescribeError::MissingCredential(GEMINI_API_KEY_VAR),
            DescribeError::ImageNotFound(PathBuf::from("plot.png")),
            DescribeError::ImageDecode {
                path: PathBuf::from("plot.png"),
                reason: "bad header".into(),
            },
            DescribeError::Remote(ModelError::Timeout),
            DescribeError::Artifact(ArtifactError::NotFound(PathBuf::from("d.txt"))),
        ];
        let mut codes: Vec<u8> = errors.iter().map(DescribeError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn image_not_found_message_names_the_path() {
        let err = DescribeError::ImageNotFound(PathBuf::from("plots/umap.png"));
        assert_eq!(err.to_string(), "'plots/umap.png' not found");
    }
}
