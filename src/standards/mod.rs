//! Wire protocol standards.

pub mod ollama;
