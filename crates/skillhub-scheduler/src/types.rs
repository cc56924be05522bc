use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use skillhub_core::types::UserId;

/// A persisted binding between a skill and a cron expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    /// UUID v4 string, primary key.
    pub id: String,
    /// The skill to run. Opaque to the scheduler.
    pub skill_id: String,
    pub skill_name: String,
    /// Always a valid expression: checked before every write.
    pub cron_expression: String,
    /// Serialised payload handed to the skill unchanged.
    pub parameters: Option<String>,
    /// Disabled tasks are left out of projections and due lists.
    pub enabled: bool,
    /// Next matching instant; recomputed on expression change and on execution.
    pub next_run: Option<DateTime<Utc>>,
    /// Most recent execution, `None` until the first one.
    pub last_run: Option<DateTime<Utc>>,
    /// Completed executions.
    pub run_count: u32,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `TaskScheduler::create_task`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub skill_id: String,
    pub skill_name: String,
    pub cron_expression: String,
    #[serde(default, deserialize_with = "opaque_payload")]
    pub parameters: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default, deserialize_with = "opaque_payload")]
    pub parameters: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// A task together with its projected run times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub task: ScheduledTask,
    pub next_runs: Vec<DateTime<Utc>>,
}

/// One projected occurrence of a task, shaped for a calendar widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// `"{task_id}-{timestamp_millis}"`, unique per task and instant.
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub skill_id: String,
    pub task_id: String,
}

impl CalendarEvent {
    pub fn new(task: &ScheduledTask, start: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", task.id, start.timestamp_millis()),
            title: task.skill_name.clone(),
            start,
            skill_id: task.skill_id.clone(),
            task_id: task.id.clone(),
        }
    }
}

/// Result of checking an expression before saving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronPreview {
    pub valid: bool,
    /// Empty when `valid` is false.
    pub description: String,
    /// `None` when invalid or when nothing matches within a year.
    pub next_run: Option<DateTime<Utc>>,
}

/// Accept parameters either as a string (stored verbatim) or as any other
/// JSON value (stored as its compact JSON text).
fn opaque_payload<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
