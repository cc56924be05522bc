use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";

// Scheduler projection limits
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;
pub const DEFAULT_MAX_UPCOMING_RUNS: usize = 50; // per task
pub const DEFAULT_MAX_CALENDAR_EVENTS: usize = 1000; // across all tasks

/// Top-level config (skillhub.toml + SKILLHUB_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillhubConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. `":memory:"` opens a throwaway in-process database.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Bounds applied when projecting task runs forward in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Window used by `upcomingTasks` when the caller gives no `days`.
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,
    /// Safety cap on projected runs per task.
    #[serde(default = "default_max_upcoming_runs")]
    pub max_upcoming_runs: usize,
    /// Global cap on calendar events per request.
    #[serde(default = "default_max_calendar_events")]
    pub max_calendar_events: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            max_upcoming_runs: DEFAULT_MAX_UPCOMING_RUNS,
            max_calendar_events: DEFAULT_MAX_CALENDAR_EVENTS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_upcoming_days() -> u32 {
    DEFAULT_UPCOMING_DAYS
}
fn default_max_upcoming_runs() -> usize {
    DEFAULT_MAX_UPCOMING_RUNS
}
fn default_max_calendar_events() -> usize {
    DEFAULT_MAX_CALENDAR_EVENTS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.skillhub/skillhub.db", home)
}

impl SkillhubConfig {
    /// Load config from a TOML file with SKILLHUB_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.skillhub/skillhub.toml
    ///
    /// A missing file is not an error: every field has a default.
    /// Nested keys use a double underscore, e.g. `SKILLHUB_GATEWAY__PORT=9000`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading config");

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::SkillhubError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(SkillhubConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SKILLHUB_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.skillhub/skillhub.toml", home)
}
