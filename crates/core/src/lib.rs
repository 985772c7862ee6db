pub mod config;
pub mod error;

pub use config::{ChannelConfig, ChannelKind, Config, EmailConfig, SlackConfig};
pub use error::ConfigError;
