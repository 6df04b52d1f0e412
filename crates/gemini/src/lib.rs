//! Gemini backend for Quizzard.
//!
//! Sends the corpus and instruction to the `generateContent` endpoint and
//! returns the model's text.

pub mod client;
pub mod wire;

pub use client::{GeminiClient, GeminiConfig};
