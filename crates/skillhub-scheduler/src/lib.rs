//! `skillhub-scheduler`: cron engine and task scheduler for skills.
//!
//! # Overview
//!
//! A [`ScheduledTask`] binds a skill to a five-field cron expression. The
//! [`TaskScheduler`] validates expressions, computes each task's `next_run`
//! and keeps run bookkeeping; it never runs a skill itself. Records live in a
//! [`TaskStore`]: [`SqliteTaskStore`] for the gateway, [`MemoryTaskStore`] for
//! embedders and tests.
//!
//! # Cron engine
//!
//! [`cron`] is pure: every computation takes its reference instant
//! explicitly. Only the scheduler consults a [`Clock`].
//!
//! | Expression     | Meaning                        |
//! |----------------|--------------------------------|
//! | `0 9 * * 1-5`  | 09:00 UTC, Monday to Friday    |
//! | `*/15 * * * *` | every quarter hour             |
//! | `0 0 1 * *`    | midnight on the first of month |

pub mod calendar;
pub mod clock;
pub mod cron;
pub mod db;
mod describe;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cron::CronExpression;
pub use db::SqliteTaskStore;
pub use error::{CronError, Result, SchedulerError};
pub use scheduler::{SchedulerLimits, TaskScheduler, MAX_UPCOMING_DAYS};
pub use store::{MemoryTaskStore, TaskStore};
pub use types::{CalendarEvent, CronPreview, NewTask, ScheduledTask, TaskUpdate, UpcomingTask};
