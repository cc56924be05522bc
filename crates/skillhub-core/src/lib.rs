//! `skillhub-core`: configuration, error codes and id types shared by every
//! skillhub crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::SkillhubConfig;
pub use error::{Result, SkillhubError};
