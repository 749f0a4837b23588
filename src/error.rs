use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("missing webhook URL (set FEISHU_WEBHOOK)")]
    MissingWebhook,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed server returned HTTP {status}")]
    FeedStatus { status: StatusCode },

    #[error("failed to parse feed: {0}")]
    FeedParse(#[from] feed_rs::parser::ParseFeedError),

    #[error("webhook returned HTTP {status}: {body}")]
    Delivery { status: StatusCode, body: String },

    /// The webhook accepted the request but refused the payload.
    #[error("webhook rejected message (code {code}): {msg}")]
    Rejected { code: i64, msg: String },

    #[error("failed to access state file {}: {source}", .path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {}: {source}", .path.display())]
    StateFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
