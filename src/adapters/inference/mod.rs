//! Suspect-inference service integration
//!
//! Wraps a chat-completions API behind a small client that turns staged
//! member documents into suspect condition candidates.

pub mod client;

pub use client::InferenceClient;
