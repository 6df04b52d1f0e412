//! PPTX (Office Open XML) adapter for Quizzard.
//!
//! Parses .pptx files which are ZIP archives containing XML documents.
//! Each slide becomes one text block.

pub mod parser;

pub use parser::PptxParser;
