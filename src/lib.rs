//! Feed Relay - forward new RSS entries to a chat webhook
//!
//! This crate polls a single feed once per invocation, works out which
//! entries are new since the last run using a persisted watermark, and
//! posts them to a Feishu/Lark style webhook as a card or plain text.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod runner;
pub mod selector;
pub mod state;

pub use config::Config;
pub use error::{RelayError, Result};
pub use runner::{RunOutcome, Runner};
