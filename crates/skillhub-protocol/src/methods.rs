// Well-known RPC method names: must match the dashboard client.

// utility
pub const PING: &str = "ping";

// scheduler
pub const VALIDATE_CRON: &str = "scheduler.validateCron";
pub const CREATE_TASK: &str = "scheduler.createTask";
pub const UPDATE_TASK: &str = "scheduler.updateTask";
pub const DELETE_TASK: &str = "scheduler.deleteTask";
pub const LIST_TASKS: &str = "scheduler.listTasks";
pub const GET_TASK: &str = "scheduler.getTask";
pub const UPCOMING_TASKS: &str = "scheduler.upcomingTasks";
pub const CALENDAR_EVENTS: &str = "scheduler.calendarEvents";
pub const MARK_EXECUTED: &str = "scheduler.markExecuted";
pub const DUE_TASKS: &str = "scheduler.dueTasks";
