//! Best-effort projection of future runs.
//!
//! Both views stop quietly at the first cron failure and return whatever was
//! collected so far; they never surface `NoMatchFound`.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::cron::CronExpression;
use crate::types::{CalendarEvent, ScheduledTask};

/// Run times of `task` from its stored `next_run` up to `until`, at most
/// `max_runs` of them.
///
/// Each step searches from one minute past the previous run. A task without a
/// `next_run` starts from the first match after `now`.
pub fn project_upcoming(
    task: &ScheduledTask,
    now: DateTime<Utc>,
    until: DateTime<Utc>,
    max_runs: usize,
) -> Vec<DateTime<Utc>> {
    let Ok(expr) = CronExpression::parse(&task.cron_expression) else {
        debug!(task_id = %task.id, "stored expression no longer parses; skipping");
        return Vec::new();
    };

    let mut current = match task.next_run {
        Some(next) => next,
        None => match expr.next_after(now) {
            Ok(next) => next,
            Err(_) => return Vec::new(),
        },
    };

    let mut runs = Vec::new();
    while current <= until && runs.len() < max_runs {
        runs.push(current);
        current = match expr.next_after(current + Duration::minutes(1)) {
            Ok(next) => next,
            Err(e) => {
                debug!(task_id = %task.id, error = %e, "upcoming projection cut short");
                break;
            }
        };
    }
    runs
}

/// Calendar events for every enabled task inside `[start, end]`, ordered by
/// start time then task id.
///
/// Keeps the earliest `max_events` events across all tasks. The flag is true
/// when later events in the window were dropped to honour the cap.
pub fn project_calendar(
    tasks: &[ScheduledTask],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_events: usize,
) -> (Vec<CalendarEvent>, bool) {
    let mut events = Vec::new();
    let mut truncated = false;

    for task in tasks.iter().filter(|t| t.enabled) {
        let Ok(expr) = CronExpression::parse(&task.cron_expression) else {
            continue;
        };

        // A stale next_run before the window would only produce events we
        // throw away, so jump straight to the window.
        let first = match task.next_run {
            Some(next) if next >= start => Ok(next),
            _ => expr.next_after(start - Duration::minutes(1)),
        };
        let Ok(mut current) = first else {
            continue;
        };

        let mut collected = 0;
        while current <= end {
            if collected == max_events {
                truncated = true;
                break;
            }
            events.push(CalendarEvent::new(task, current));
            collected += 1;
            current = match expr.next_after(current) {
                Ok(next) => next,
                Err(_) => break,
            };
        }
    }

    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.task_id.cmp(&b.task_id)));
    if events.len() > max_events {
        events.truncate(max_events);
        truncated = true;
    }
    (events, truncated)
}
