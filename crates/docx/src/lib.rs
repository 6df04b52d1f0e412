//! DOCX (Office Open XML) adapter for Quizzard.
//!
//! Parses .docx files which are ZIP archives containing XML documents.
//! Body text is grouped into sections; tables and embedded media are
//! reported separately.

pub mod parser;

pub use parser::DocxParser;
