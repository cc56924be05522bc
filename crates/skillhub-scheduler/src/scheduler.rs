use chrono::{DateTime, Duration, Utc};
use skillhub_core::config::{
    SchedulerConfig, DEFAULT_MAX_CALENDAR_EVENTS, DEFAULT_MAX_UPCOMING_RUNS, DEFAULT_UPCOMING_DAYS,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    calendar::{project_calendar, project_upcoming},
    clock::{Clock, SystemClock},
    cron::CronExpression,
    error::{Result, SchedulerError},
    store::TaskStore,
    types::{CalendarEvent, CronPreview, NewTask, ScheduledTask, TaskUpdate, UpcomingTask},
};

/// Longest window `get_upcoming_tasks` accepts, in days.
pub const MAX_UPCOMING_DAYS: u32 = 366;

/// Caps applied to the projection views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerLimits {
    /// Window used by `get_upcoming_tasks` when the caller gives none.
    pub upcoming_days: u32,
    /// Per-task cap on projected runs.
    pub max_upcoming_runs: usize,
    /// Cap on calendar events across all tasks.
    pub max_calendar_events: usize,
}

impl Default for SchedulerLimits {
    fn default() -> Self {
        Self {
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            max_upcoming_runs: DEFAULT_MAX_UPCOMING_RUNS,
            max_calendar_events: DEFAULT_MAX_CALENDAR_EVENTS,
        }
    }
}

impl From<&SchedulerConfig> for SchedulerLimits {
    fn from(cfg: &SchedulerConfig) -> Self {
        Self {
            upcoming_days: cfg.upcoming_days,
            max_upcoming_runs: cfg.max_upcoming_runs,
            max_calendar_events: cfg.max_calendar_events,
        }
    }
}

/// Lifecycle manager for scheduled tasks.
///
/// Computes `next_run` on create, on expression change and on execution, and
/// projects future runs for the dashboard. Performs no execution itself: an
/// external trigger polls [`TaskScheduler::due_tasks`], runs the skill and
/// reports back through [`TaskScheduler::mark_executed`].
///
/// Each operation is a single read-modify-write against the store with no
/// locking across the pair; concurrent edits of one task are last-writer-wins.
pub struct TaskScheduler {
    store: Box<dyn TaskStore>,
    clock: Box<dyn Clock>,
    limits: SchedulerLimits,
}

impl TaskScheduler {
    /// Scheduler over `store` using the wall clock and default limits.
    pub fn new(store: impl TaskStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(SystemClock),
            limits: SchedulerLimits::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_limits(mut self, limits: SchedulerLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> SchedulerLimits {
        self.limits
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validate an expression and, when valid, describe it and compute its
    /// next run from now. Never fails.
    pub fn preview(&self, expression: &str) -> CronPreview {
        match CronExpression::parse(expression) {
            Ok(expr) => CronPreview {
                valid: true,
                description: expr.describe(),
                next_run: expr.next_after(self.now()).ok(),
            },
            Err(e) => {
                debug!(%expression, error = %e, "cron preview rejected");
                CronPreview {
                    valid: false,
                    description: String::new(),
                    next_run: None,
                }
            }
        }
    }

    /// Validate, schedule and persist a new task.
    ///
    /// Nothing is written when the expression is invalid or can never match.
    pub fn create_task(&self, input: NewTask) -> Result<ScheduledTask> {
        let expr = CronExpression::parse(&input.cron_expression)?;
        let now = self.now();
        let next_run = expr.next_after(now)?;

        let task = ScheduledTask {
            id: Uuid::new_v4().to_string(),
            skill_id: input.skill_id,
            skill_name: input.skill_name,
            cron_expression: input.cron_expression,
            parameters: input.parameters,
            enabled: true,
            next_run: Some(next_run),
            last_run: None,
            run_count: 0,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&task)?;

        info!(task_id = %task.id, skill_id = %task.skill_id, cron = %task.cron_expression, %next_run, "task created");
        Ok(task)
    }

    /// Apply a partial update. `next_run` is recomputed from now only when
    /// the expression changes; toggling `enabled` leaves it alone.
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Result<ScheduledTask> {
        let new_expr = update
            .cron_expression
            .as_deref()
            .map(CronExpression::parse)
            .transpose()?;

        let mut task = self.get_task(id)?;
        let now = self.now();

        if let Some(expr) = new_expr {
            task.next_run = Some(expr.next_after(now)?);
            task.cron_expression = expr.as_str().to_string();
        }
        if let Some(parameters) = update.parameters {
            task.parameters = Some(parameters);
        }
        if let Some(enabled) = update.enabled {
            task.enabled = enabled;
        }
        task.updated_at = now;

        self.store.update(&task)?;
        info!(task_id = %id, enabled = task.enabled, cron = %task.cron_expression, "task updated");
        Ok(task)
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        self.store.delete(id)?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<ScheduledTask> {
        self.store
            .get(id)?
            .ok_or_else(|| SchedulerError::NotFound { id: id.to_string() })
    }

    /// Every task, enabled or not, oldest first.
    pub fn get_all_tasks(&self) -> Result<Vec<ScheduledTask>> {
        self.store.list()
    }

    /// Projected runs of every enabled task over the next `days` days.
    ///
    /// Fails with [`SchedulerError::InvalidWindow`] past [`MAX_UPCOMING_DAYS`].
    pub fn get_upcoming_tasks(&self, days: u32) -> Result<Vec<UpcomingTask>> {
        if days > MAX_UPCOMING_DAYS {
            return Err(SchedulerError::InvalidWindow(format!(
                "days must be at most {MAX_UPCOMING_DAYS}, got {days}"
            )));
        }
        let now = self.now();
        let until = Duration::try_days(i64::from(days))
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| SchedulerError::InvalidWindow(format!("{days} days from {now} is out of range")))?;

        let upcoming = self
            .store
            .list()?
            .into_iter()
            .filter(|t| t.enabled)
            .map(|task| {
                let next_runs = project_upcoming(&task, now, until, self.limits.max_upcoming_runs);
                UpcomingTask { task, next_runs }
            })
            .collect();
        Ok(upcoming)
    }

    /// Calendar events for enabled tasks inside `[start, end]`.
    pub fn calendar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let tasks = self.store.list()?;
        let (events, truncated) = project_calendar(&tasks, start, end, self.limits.max_calendar_events);
        if truncated {
            warn!(%start, %end, cap = self.limits.max_calendar_events, "calendar projection truncated");
        }
        Ok(events)
    }

    /// Record a completed run: stamp `last_run`, bump `run_count` and
    /// schedule the following run.
    pub fn mark_executed(&self, id: &str) -> Result<ScheduledTask> {
        let mut task = self.get_task(id)?;
        let now = self.now();

        task.next_run = Some(CronExpression::parse(&task.cron_expression)?.next_after(now)?);
        task.last_run = Some(now);
        task.run_count = task.run_count.saturating_add(1);
        task.updated_at = now;

        self.store.update(&task)?;
        info!(task_id = %id, run_count = task.run_count, next_run = ?task.next_run, "task executed");
        Ok(task)
    }

    /// Enabled tasks whose `next_run` has arrived, earliest first.
    pub fn due_tasks(&self) -> Result<Vec<ScheduledTask>> {
        let now = self.now();
        let mut due: Vec<ScheduledTask> = self
            .store
            .list()?
            .into_iter()
            .filter(|t| t.enabled && t.next_run.is_some_and(|next| next <= now))
            .collect();
        due.sort_by_key(|t| t.next_run);
        Ok(due)
    }
}
