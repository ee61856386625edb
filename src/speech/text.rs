//! Text preparation before synthesis.
//!
//! The description comes straight from the model and may be plain prose,
//! markdown bullets, or SSML wrapped in `<speak>` tags.  [`prepare`] turns it
//! into a [`SynthesisInput`] according to the [`InputMode`]:
//!
//! | Mode    | Processing                                                      |
//! |---------|-----------------------------------------------------------------|
//! | `plain` | none, submitted as text                                         |
//! | `ssml`  | markdown cleanup (optional), whitespace collapse, bare `&`/`<` escape, `<speak>` wrap |
//!
//! SSML preparation is idempotent: preparing already-prepared text returns it
//! unchanged.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// InputMode
// ---------------------------------------------------------------------------

/// How the description is submitted to the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Raw text, no cleanup.
    Plain,
    /// SSML markup, whitespace-normalized.
    Ssml,
}

impl Default for InputMode {
    fn default() -> Self {
        Self::Ssml
    }
}

// ---------------------------------------------------------------------------
// SynthesisInput
// ---------------------------------------------------------------------------

/// Text ready to be sent to a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisInput {
    Text(String),
    Ssml(String),
}

impl SynthesisInput {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Ssml(s) => s,
        }
    }

    /// SSML form of the input.  Plain text is XML-escaped and wrapped.
    pub fn to_ssml(&self) -> String {
        match self {
            Self::Ssml(s) => s.clone(),
            Self::Text(s) => format!("<speak>{}</speak>", escape_xml(s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Regexes
// ---------------------------------------------------------------------------

/// A leading markdown header (`#`..`######`) or bullet (`*`, `-`, `+`, `•`).
fn line_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:#{1,6}\s*|[*\-+•]\s+)").expect("valid marker regex"))
}

/// Bold / italic emphasis delimited by asterisks.
fn emphasis() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*+([^*\n]+)\*+").expect("valid emphasis regex"))
}

/// An XML entity at the start of a string, without the leading `&`.
fn entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z]+|#[0-9]+|#x[0-9A-Fa-f]+);").expect("valid entity regex")
    })
}

// ---------------------------------------------------------------------------
// Cleanup steps
// ---------------------------------------------------------------------------

/// Collapse every run of whitespace, newlines included, into one space and
/// trim both ends.
///
/// ```
/// use plsdescribe::speech::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a\n\n b\t c "), "a b c");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_line_markers(line: &str) -> String {
    let mut current = line.trim().to_string();
    loop {
        let next = line_marker().replace(&current, "").trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn ends_with_pause(line: &str) -> bool {
    matches!(
        line.chars().last(),
        Some('.' | '!' | '?' | ',' | ';' | ':' | '>')
    )
}

/// Remove markdown so the voice does not read out "asterisk".
///
/// Headers and bullet markers are dropped, emphasis markers and any stray
/// asterisks are removed, and each remaining line becomes a sentence: a period is added when the line
/// does not already end with punctuation or a tag.  Lines are joined with a
/// single space.
pub fn clean_markdown(text: &str) -> String {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let line = strip_line_markers(line);
        let line = emphasis().replace_all(&line, "$1").replace('*', "");
        let mut line = strip_line_markers(&line);
        if line.is_empty() {
            continue;
        }
        if !ends_with_pause(&line) {
            line.push('.');
        }
        sentences.push(line);
    }

    sentences.join(" ")
}

/// Escape ampersands that do not start an entity and `<` that cannot start a
/// tag.  Tags and existing entities are left alone, so this is a fixed point.
fn escape_bare_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        let rest = &text[i + c.len_utf8()..];
        match c {
            '&' if !entity().is_match(rest) => out.push_str("&amp;"),
            '<' if !rest.starts_with(|n: char| n.is_ascii_alphabetic() || n == '/') => {
                out.push_str("&lt;")
            }
            _ => out.push(c),
        }
    }
    out
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Prepare `text` for synthesis.
///
/// * [`InputMode::Plain`] returns the text untouched.
/// * [`InputMode::Ssml`] optionally strips markdown, collapses whitespace,
///   escapes bare `&` and `<`, and wraps the result in `<speak>` unless a
///   `<speak>` tag is already present.
pub fn prepare(text: &str, mode: InputMode, strip_markdown: bool) -> SynthesisInput {
    match mode {
        InputMode::Plain => SynthesisInput::Text(text.to_string()),
        InputMode::Ssml => {
            let cleaned = if strip_markdown {
                clean_markdown(text)
            } else {
                text.to_string()
            };
            let mut ssml = escape_bare_markup(&normalize_whitespace(&cleaned));
            if !ssml.contains("<speak") {
                ssml = format!("<speak>{ssml}</speak>");
            }
            SynthesisInput::Ssml(ssml)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
