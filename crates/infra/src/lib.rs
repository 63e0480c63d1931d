//! Infrastructure layer: storage, the tour read pipeline, email and configuration.

pub mod config;
pub mod documents;
pub mod email;
pub mod html;
pub mod query;
pub mod repositories;
pub mod store;

pub use config::{AppConfig, ConfigError, Environment, SmtpSettings};
