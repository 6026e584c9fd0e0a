//! medform: a form controller for a medical prediction backend.
//!
//! Four mutually exclusive forms (blood donation, diabetes, cardiovascular
//! disease, liver disease) each coerce their raw inputs, post them to one
//! backend model and render the predicted label with per-class
//! probabilities. The controller is a pure state machine driven from a
//! terminal session, a one-shot CLI, or an embedded web page.

pub mod analytics;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod form;
pub mod render;
pub mod session;
pub mod storage;
pub mod theme;
pub mod web;
