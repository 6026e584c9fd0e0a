//! Prediction analytics: the JSONL prediction log, the plain-text
//! diagnostic log, and the history reporter built on top of them.

pub mod logger;
pub mod reporter;
