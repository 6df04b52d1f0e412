//! PDF adapter for Quizzard.
//!
//! Reads text page by page and collects embedded image streams.

pub mod parser;

pub use parser::PdfParser;
