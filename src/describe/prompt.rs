//! Prompt builder for plot descriptions.
//!
//! [`PromptBuilder`] assembles the prompt sent alongside the image:
//!
//! ```text
//! preamble(field) + instruction(verbosity) + context + question
//! ```
//!
//! The pieces are concatenated as-is; no separators are inserted, so every
//! fragment carries its own trailing space where one is wanted.

use crate::config::DescriberConfig;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// One-sentence summary.
const INSTRUCTION_CONCISE: &str = "Describe this plot in one clear and concise sentence.";

/// Bullet-point description wrapped in SSML, ready for the speech stage.
const INSTRUCTION_DETAILED: &str = "Describe the key characteristics of the clusters in this \
plot, focusing on their relative positions, sizes, and separation. Use four or less bullet \
points for your description. Enclose answer in <speak> tags, and use basic SSML tags to \
improve generation, but avoid html tags and <break> in particular.";

// ---------------------------------------------------------------------------
// Verbosity
// ---------------------------------------------------------------------------

/// Selects which instruction template is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// One clear sentence.
    Concise,
    /// Up to four bullet points, SSML-wrapped.
    Detailed,
}

impl Verbosity {
    /// Map a numeric verbosity level to a template.
    ///
    /// Levels `0` and `1` are concise; anything from `2` upwards is detailed.
    ///
    /// ```
    /// use plsdescribe::describe::Verbosity;
    ///
    /// assert_eq!(Verbosity::from_level(1), Verbosity::Concise);
    /// assert_eq!(Verbosity::from_level(2), Verbosity::Detailed);
    /// assert_eq!(Verbosity::from_level(7), Verbosity::Detailed);
    /// ```
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Concise,
            _ => Self::Detailed,
        }
    }

    /// The instruction text for this level.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Concise => INSTRUCTION_CONCISE,
            Self::Detailed => INSTRUCTION_DETAILED,
        }
    }
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds description and follow-up prompts for one field/context pair.
///
/// # Example
/// ```rust
/// use plsdescribe::describe::{PromptBuilder, Verbosity};
///
/// let builder = PromptBuilder::new("bioinformatics", "Additional context: a UMAP. ");
/// let prompt = builder.build(Verbosity::Concise, Some("Focus on color."));
/// assert!(prompt.ends_with("a UMAP. Focus on color."));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    field: String,
    context: String,
}

impl PromptBuilder {
    pub fn new(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn from_config(config: &DescriberConfig) -> Self {
        Self::new(config.field.clone(), config.context.clone())
    }

    /// Role preamble naming the field.
    pub fn preamble(&self) -> String {
        format!(
            "You are an assistant to a data scientist, in the field of {}. Your task is to \
             describe plots, with minimal interpretation, unless explicitely asked otherwise. \
             The goal is to enable accesibility features in data analysis tools. ",
            self.field
        )
    }

    /// Build the initial description prompt.
    ///
    /// `question` is appended verbatim.  `None` and `Some("")` produce the
    /// same prompt.
    pub fn build(&self, verbosity: Verbosity, question: Option<&str>) -> String {
        let mut prompt = self.preamble();
        prompt.push_str(verbosity.instruction());
        prompt.push_str(&self.context);
        if let Some(q) = question {
            prompt.push_str(q);
        }
        prompt
    }

    /// Build a follow-up prompt that carries the previous answer.
    pub fn build_follow_up(&self, previous: &str, question: &str) -> String {
        format!(
            "{}{} Previous description: {} User question: {}",
            self.preamble(),
            self.context.trim_end(),
            previous,
            question
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&DescriberConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
