// src/models/mod.rs

//! Domain models for the relay.

mod announcement;
mod config;
mod seen;

// Re-export all public types
pub use announcement::Announcement;
pub use config::{
    Config, HttpConfig, LoggingConfig, MonitorConfig, ServerConfig, SourceConfig, TagRule,
    TelegramConfig,
};
pub use seen::SeenSet;
