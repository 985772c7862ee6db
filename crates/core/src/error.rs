use thiserror::Error;

use crate::config::ChannelKind;

/// Configuration problems. These are never retried: retrying cannot fix
/// missing credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} channel is not configured")]
    Unconfigured(ChannelKind),

    #[error("{channel} channel is missing required setting {field}")]
    MissingField {
        channel: ChannelKind,
        field: &'static str,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
