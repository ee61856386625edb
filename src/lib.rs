//! plsdescribe: spoken descriptions of data-visualization plots.
//!
//! Two stages share this crate:
//!
//! 1. [`describe`] sends a plot image and a prompt to a vision-language model
//!    and writes the answer to the description artifact (`description.txt`).
//! 2. [`speech`] reads that text, synthesizes it with Cloud Text-to-Speech and
//!    plays it through [`audio`].
//!
//! The `plsdescribe` and `plsspeak` binaries wire the stages to the command
//! line.

pub mod artifact;
pub mod audio;
pub mod config;
pub mod describe;
pub mod speech;
