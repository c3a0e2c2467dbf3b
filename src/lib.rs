//! HTTP relay in front of Google Gemini
//!
//! Accepts a text prompt or an uploaded audio file, forwards it to Gemini's
//! `generateContent` endpoint (staging audio through the File API first), and
//! relays the extracted text back to the caller.

pub mod config;
pub mod error;
pub mod gemini;
pub mod media;
pub mod models;
pub mod prompts;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
