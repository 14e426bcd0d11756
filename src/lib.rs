//! Paragraph reflow for plain text, Markdown and source comments.
//!
//! The [`wrap`] module fills paragraphs to a width while keeping
//! indentation, list markers and verbatim blocks intact. Markdown input is
//! classified line by line by [`markdown::Classifier`]. The [`wrapc`]
//! module applies the same engine to the bodies of source-code comments.

#[macro_use]
mod macros;

pub mod cli;
pub mod comment;
pub mod config;
pub mod error;
pub mod io;
pub mod line;
pub mod markdown;
pub mod pipe;
pub mod protocol;
pub mod wrap;
pub mod wrapc;

pub use crate::{
    error::{Error, Result},
    markdown::{BlockState, Classifier, LineKind},
    wrap::{Formatter, WrapOptions, wrap_lines, wrap_stream},
};
