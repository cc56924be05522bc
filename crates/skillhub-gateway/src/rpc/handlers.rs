//! Concrete RPC method handler functions.
//!
//! Each function extracts its parameters, calls the `TaskScheduler` in
//! `AppState`, and returns a `ResFrame`. `dispatch::route` is the only
//! caller.
//!
//! Successful payloads carry the bare result: a task, an array of tasks,
//! upcoming entries or calendar events. Mutations without a result answer
//! `{ "success": true }`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use skillhub_core::SkillhubError;
use skillhub_protocol::frames::ResFrame;
use skillhub_scheduler::{NewTask, SchedulerError, TaskUpdate, MAX_UPCOMING_DAYS};
use tracing::{debug, warn};

use crate::app::AppState;

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Deserialize)]
struct ValidateParams {
    expression: String,
}

#[derive(Deserialize)]
struct UpdateParams {
    id: String,
    #[serde(flatten)]
    update: TaskUpdate,
}

#[derive(Deserialize, Default)]
struct UpcomingParams {
    #[serde(default)]
    days: Option<u32>,
}

#[derive(Deserialize)]
struct CalendarParams {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Deserialize the params object into `T`.
fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, SkillhubError> {
    let p = params.ok_or_else(|| SkillhubError::InvalidParams("params object required".into()))?;
    serde_json::from_value(p.clone()).map_err(|e| SkillhubError::InvalidParams(e.to_string()))
}

/// Like [`parse_params`], but a missing params object means "all defaults".
fn parse_optional_params<T: DeserializeOwned + Default>(
    params: Option<&Value>,
) -> Result<T, SkillhubError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(_) => parse_params(params),
    }
}

fn require_id(params: Option<&Value>) -> Result<String, SkillhubError> {
    let IdParams { id } = parse_params(params)?;
    if id.is_empty() {
        return Err(SkillhubError::InvalidParams("missing or empty 'id' field".into()));
    }
    Ok(id)
}

fn invalid_params(req_id: &str, e: SkillhubError) -> ResFrame {
    ResFrame::err(req_id, e.code(), &e.to_string())
}

/// Map a scheduler failure to an error frame. Caller mistakes log at debug,
/// store failures at warn.
fn scheduler_error(req_id: &str, method: &str, e: SchedulerError) -> ResFrame {
    match e {
        SchedulerError::InvalidExpression(_)
        | SchedulerError::NotFound { .. }
        | SchedulerError::NoMatchFound { .. }
        | SchedulerError::InvalidWindow(_) => debug!(method, error = %e, "request rejected"),
        SchedulerError::Database(_) | SchedulerError::Storage(_) => {
            warn!(method, error = %e, "scheduler call failed")
        }
    }
    ResFrame::err(req_id, e.code(), &e.to_string())
}

fn success(req_id: &str) -> ResFrame {
    ResFrame::ok(req_id, json!({ "success": true }))
}

// ---------------------------------------------------------------------------
// scheduler.validateCron
// ---------------------------------------------------------------------------

/// Handler for `scheduler.validateCron`.
///
/// Params: `{ "expression": string }`
///
/// Never fails for a bad expression: the payload reports `valid: false`.
pub async fn handle_validate_cron(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    match parse_params::<ValidateParams>(params) {
        Ok(p) => ResFrame::ok(req_id, app.scheduler.preview(&p.expression)),
        Err(e) => invalid_params(req_id, e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.createTask
// ---------------------------------------------------------------------------

/// Handler for `scheduler.createTask`.
///
/// Params: `{ "skillId": string, "skillName": string, "cronExpression": string,
/// "parameters"?: any, "createdBy"?: string }`
pub async fn handle_create_task(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    let input: NewTask = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return invalid_params(req_id, e),
    };
    if input.skill_id.is_empty() {
        return ResFrame::err(req_id, "INVALID_PARAMS", "missing or empty 'skillId' field");
    }
    if input.skill_name.is_empty() {
        return ResFrame::err(req_id, "INVALID_PARAMS", "missing or empty 'skillName' field");
    }

    match app.scheduler.create_task(input) {
        Ok(task) => ResFrame::ok(req_id, task),
        Err(e) => scheduler_error(req_id, "scheduler.createTask", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.updateTask
// ---------------------------------------------------------------------------

/// Handler for `scheduler.updateTask`.
///
/// Params: `{ "id": string, "cronExpression"?: string, "parameters"?: any,
/// "enabled"?: bool }`
pub async fn handle_update_task(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    let UpdateParams { id, update } = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return invalid_params(req_id, e),
    };

    match app.scheduler.update_task(&id, update) {
        Ok(_) => success(req_id),
        Err(e) => scheduler_error(req_id, "scheduler.updateTask", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.deleteTask
// ---------------------------------------------------------------------------

/// Handler for `scheduler.deleteTask`.
///
/// Params: `{ "id": string }`
pub async fn handle_delete_task(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    let id = match require_id(params) {
        Ok(id) => id,
        Err(e) => return invalid_params(req_id, e),
    };

    match app.scheduler.delete_task(&id) {
        Ok(()) => success(req_id),
        Err(e) => scheduler_error(req_id, "scheduler.deleteTask", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.listTasks / scheduler.getTask
// ---------------------------------------------------------------------------

/// Handler for `scheduler.listTasks`. Returns every task, enabled or not.
pub async fn handle_list_tasks(req_id: &str, app: &AppState) -> ResFrame {
    match app.scheduler.get_all_tasks() {
        Ok(tasks) => ResFrame::ok(req_id, tasks),
        Err(e) => scheduler_error(req_id, "scheduler.listTasks", e),
    }
}

/// Handler for `scheduler.getTask`.
///
/// Params: `{ "id": string }`
pub async fn handle_get_task(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    let id = match require_id(params) {
        Ok(id) => id,
        Err(e) => return invalid_params(req_id, e),
    };

    match app.scheduler.get_task(&id) {
        Ok(task) => ResFrame::ok(req_id, task),
        Err(e) => scheduler_error(req_id, "scheduler.getTask", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.upcomingTasks
// ---------------------------------------------------------------------------

/// Handler for `scheduler.upcomingTasks`.
///
/// Params: `{ "days"?: number }`, defaulting to `scheduler.upcoming_days`
/// and capped at [`MAX_UPCOMING_DAYS`].
pub async fn handle_upcoming_tasks(
    params: Option<&Value>,
    req_id: &str,
    app: &AppState,
) -> ResFrame {
    let p: UpcomingParams = match parse_optional_params(params) {
        Ok(p) => p,
        Err(e) => return invalid_params(req_id, e),
    };
    let days = p.days.unwrap_or(app.scheduler.limits().upcoming_days);
    if days > MAX_UPCOMING_DAYS {
        return invalid_params(
            req_id,
            SkillhubError::InvalidParams(format!("'days' must be at most {MAX_UPCOMING_DAYS}")),
        );
    }

    match app.scheduler.get_upcoming_tasks(days) {
        Ok(upcoming) => ResFrame::ok(req_id, upcoming),
        Err(e) => scheduler_error(req_id, "scheduler.upcomingTasks", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.calendarEvents
// ---------------------------------------------------------------------------

/// Handler for `scheduler.calendarEvents`.
///
/// Params: `{ "start": RFC 3339, "end": RFC 3339 }`
pub async fn handle_calendar_events(
    params: Option<&Value>,
    req_id: &str,
    app: &AppState,
) -> ResFrame {
    let CalendarParams { start, end } = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return invalid_params(req_id, e),
    };
    if start > end {
        return ResFrame::err(req_id, "INVALID_PARAMS", "'start' must not be after 'end'");
    }

    match app.scheduler.calendar_events(start, end) {
        Ok(events) => ResFrame::ok(req_id, events),
        Err(e) => scheduler_error(req_id, "scheduler.calendarEvents", e),
    }
}

// ---------------------------------------------------------------------------
// scheduler.markExecuted / scheduler.dueTasks
// ---------------------------------------------------------------------------

/// Handler for `scheduler.markExecuted`.
///
/// Params: `{ "id": string }`
pub async fn handle_mark_executed(params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    let id = match require_id(params) {
        Ok(id) => id,
        Err(e) => return invalid_params(req_id, e),
    };

    match app.scheduler.mark_executed(&id) {
        Ok(_) => success(req_id),
        Err(e) => scheduler_error(req_id, "scheduler.markExecuted", e),
    }
}

/// Handler for `scheduler.dueTasks`. Enabled tasks whose run time has come.
pub async fn handle_due_tasks(req_id: &str, app: &AppState) -> ResFrame {
    match app.scheduler.due_tasks() {
        Ok(tasks) => ResFrame::ok(req_id, tasks),
        Err(e) => scheduler_error(req_id, "scheduler.dueTasks", e),
    }
}
