//! Prompt construction for the two generative stages.
//!
//! Prompts are pure functions of their inputs: identical inputs produce
//! byte-identical messages, and therefore identical fingerprints.

pub mod narrative;
pub mod render;
pub mod synthesis;
