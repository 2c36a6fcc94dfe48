//! Report template language: `{{var}}`, `{{#each list}}`, `{{#if flag}}`.
//!
//! This crate provides:
//! - Single-pass parsing into a nested node tree with balanced-marker
//!   checking
//! - Rendering over a [`baseops_core::Value`] context with dotted-path
//!   lookup and silent-miss semantics
//! - Built-in date variables (`TODAY`, `YESTERDAY`, `NOW`, `WEEK_START`,
//!   `WEEK_END`) injected from an injectable clock

pub mod parser;
pub mod render;

pub use parser::{parse, Node};
pub use render::Renderer;

use thiserror::Error;

/// Errors from parsing or rendering a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Unbalanced, mismatched, or malformed markers. `offset` is the byte
    /// position of the offending marker in the template text.
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Structural mismatch between template and context, e.g. an
    /// each-target that is not a list.
    #[error("template render error: {0}")]
    Render(String),
}
