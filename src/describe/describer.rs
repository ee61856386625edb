//! The description stage: image + prompt → model → text.
//!
//! A [`Describer`] only accepts an already-loaded [`ImageInput`], so a
//! missing or broken file never reaches the model.

use std::sync::Arc;

use super::input::ImageInput;
use super::model::VisionModel;
use super::prompt::{PromptBuilder, Verbosity};
use super::DescribeError;

/// A prompt and the model's answer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub prompt: String,
    pub text: String,
}

/// Asks a [`VisionModel`] about one image at a time.
pub struct Describer {
    model: Arc<dyn VisionModel>,
    prompts: PromptBuilder,
}

impl Describer {
    pub fn new(model: Arc<dyn VisionModel>, prompts: PromptBuilder) -> Self {
        Self { model, prompts }
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Describe an already-loaded image.
    pub async fn describe(
        &self,
        image: &ImageInput,
        verbosity: Verbosity,
        question: Option<&str>,
    ) -> Result<Description, DescribeError> {
        let prompt = self.prompts.build(verbosity, question);
        self.ask(image, prompt).await
    }

    /// Ask a follow-up question that carries the previous answer.
    pub async fn follow_up(
        &self,
        image: &ImageInput,
        previous: &str,
        question: &str,
    ) -> Result<Description, DescribeError> {
        let prompt = self.prompts.build_follow_up(previous, question);
        self.ask(image, prompt).await
    }

    async fn ask(&self, image: &ImageInput, prompt: String) -> Result<Description, DescribeError> {
        let (width, height) = image.dimensions();
        log::info!(
            "asking model about {} ({width}x{height})",
            image.path().display()
        );
        let text = self.model.describe(&prompt, image).await?;
        log::info!("model answered ({} chars)", text.len());
        Ok(Description { prompt, text })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
