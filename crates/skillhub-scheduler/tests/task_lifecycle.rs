// Drive a task through its whole life the way the gateway and an external
// execution trigger would, against the SQLite store.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use skillhub_scheduler::{
    ManualClock, NewTask, SchedulerError, SqliteTaskStore, TaskScheduler, TaskUpdate,
};

#[test]
fn weekday_task_lifecycle() {
    // Friday 2026-01-09 10:00 UTC.
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 9, 10, 0, 0).unwrap()));
    let scheduler = TaskScheduler::new(SqliteTaskStore::open_in_memory().unwrap())
        .with_clock(Arc::clone(&clock));

    let task = scheduler
        .create_task(NewTask {
            skill_id: "pr-review".into(),
            skill_name: "PR review digest".into(),
            cron_expression: "0 9 * * 1-5".into(),
            parameters: Some(r#"{"repo":"acme/api"}"#.into()),
            created_by: Some("user-1".into()),
        })
        .unwrap();
    let monday_9am = Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap();
    assert_eq!(task.next_run, Some(monday_9am));

    // Nothing is due over the weekend.
    clock.set(Utc.with_ymd_and_hms(2026, 1, 11, 23, 0, 0).unwrap());
    assert!(scheduler.due_tasks().unwrap().is_empty());

    // Monday morning the trigger picks it up and reports back.
    clock.set(monday_9am + Duration::seconds(2));
    let due = scheduler.due_tasks().unwrap();
    assert_eq!(due.len(), 1);
    let done = scheduler.mark_executed(&due[0].id).unwrap();
    assert_eq!(done.run_count, 1);
    assert_eq!(done.next_run, Some(monday_9am + Duration::days(1)));
    assert!(scheduler.due_tasks().unwrap().is_empty());

    // A week of upcoming runs: Tuesday to Friday, then Monday.
    let upcoming = scheduler.get_upcoming_tasks(7).unwrap();
    assert_eq!(upcoming[0].next_runs.len(), 5);

    // Pausing hides the task from projections but keeps it listed.
    scheduler
        .update_task(
            &task.id,
            TaskUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(scheduler.get_upcoming_tasks(7).unwrap().is_empty());
    let start = monday_9am;
    assert!(scheduler
        .calendar_events(start, start + Duration::days(7))
        .unwrap()
        .is_empty());
    assert_eq!(scheduler.get_all_tasks().unwrap().len(), 1);

    scheduler.delete_task(&task.id).unwrap();
    assert!(matches!(
        scheduler.get_task(&task.id),
        Err(SchedulerError::NotFound { .. })
    ));
}
