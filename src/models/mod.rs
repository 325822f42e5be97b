//! API data models
//!
//! Request and response structures for OpenAI-compatible chat completions.

pub mod openai;
