use serde_json::Value;
use skillhub_core::SkillhubError;
use skillhub_protocol::{frames::ResFrame, methods};

use crate::app::AppState;
use crate::rpc::handlers;

/// Route an RPC method call to the correct handler.
///
/// All handlers are in `rpc/handlers.rs`.
pub async fn route(method: &str, params: Option<&Value>, req_id: &str, app: &AppState) -> ResFrame {
    match method {
        // ------------------------------------------------------------------
        // Utility
        // ------------------------------------------------------------------
        methods::PING => ResFrame::ok(req_id, serde_json::json!({ "pong": true })),

        // ------------------------------------------------------------------
        // Cron expressions
        // ------------------------------------------------------------------
        methods::VALIDATE_CRON => handlers::handle_validate_cron(params, req_id, app).await,

        // ------------------------------------------------------------------
        // Task lifecycle
        // ------------------------------------------------------------------
        methods::CREATE_TASK => handlers::handle_create_task(params, req_id, app).await,

        methods::UPDATE_TASK => handlers::handle_update_task(params, req_id, app).await,

        methods::DELETE_TASK => handlers::handle_delete_task(params, req_id, app).await,

        methods::LIST_TASKS => handlers::handle_list_tasks(req_id, app).await,

        methods::GET_TASK => handlers::handle_get_task(params, req_id, app).await,

        methods::MARK_EXECUTED => handlers::handle_mark_executed(params, req_id, app).await,

        methods::DUE_TASKS => handlers::handle_due_tasks(req_id, app).await,

        // ------------------------------------------------------------------
        // Projections
        // ------------------------------------------------------------------
        methods::UPCOMING_TASKS => handlers::handle_upcoming_tasks(params, req_id, app).await,

        methods::CALENDAR_EVENTS => handlers::handle_calendar_events(params, req_id, app).await,

        // ------------------------------------------------------------------
        // Fallthrough
        // ------------------------------------------------------------------
        _ => {
            let e = SkillhubError::MethodNotFound {
                method: method.to_string(),
            };
            ResFrame::err(req_id, e.code(), &e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_state;
    use serde_json::json;

    async fn call(app: &AppState, method: &str, params: Value) -> ResFrame {
        let params = (!params.is_null()).then_some(params);
        route(method, params.as_ref(), "req-1", app).await
    }

    async fn create(app: &AppState, cron: &str) -> String {
        let res = call(
            app,
            methods::CREATE_TASK,
            json!({ "skillId": "s-1", "skillName": "Digest", "cronExpression": cron }),
        )
        .await;
        assert!(res.ok, "{:?}", res.error);
        let payload = res.payload.unwrap();
        payload["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn ping_pongs() {
        let app = test_state();
        let res = call(&app, methods::PING, Value::Null).await;
        assert!(res.ok);
        assert_eq!(res.id, "req-1");
        assert_eq!(res.payload.unwrap()["pong"], true);
    }

    #[tokio::test]
    async fn unknown_method() {
        let app = test_state();
        let res = call(&app, "scheduler.explode", Value::Null).await;
        assert_eq!(res.error_code(), Some("METHOD_NOT_FOUND"));
    }

    #[tokio::test]
    async fn validate_cron_reports_instead_of_failing() {
        let app = test_state();

        let res = call(&app, methods::VALIDATE_CRON, json!({ "expression": "0 9 * * 1-5" })).await;
        let p = res.payload.unwrap();
        assert_eq!(p["valid"], true);
        assert!(p["description"].as_str().unwrap().contains("Monday-Friday"));
        assert_eq!(p["nextRun"], "2026-01-12T09:00:00Z");

        let res = call(&app, methods::VALIDATE_CRON, json!({ "expression": "60 * * * *" })).await;
        assert!(res.ok);
        let p = res.payload.unwrap();
        assert_eq!(p["valid"], false);
        assert_eq!(p["description"], "");
        assert_eq!(p["nextRun"], Value::Null);

        let res = call(&app, methods::VALIDATE_CRON, Value::Null).await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));
    }

    #[tokio::test]
    async fn create_task_validates_input() {
        let app = test_state();

        let res = call(
            &app,
            methods::CREATE_TASK,
            json!({ "skillId": "s-1", "skillName": "Digest", "cronExpression": "a b c d e" }),
        )
        .await;
        assert_eq!(res.error_code(), Some("INVALID_EXPRESSION"));

        let res = call(
            &app,
            methods::CREATE_TASK,
            json!({ "skillId": "", "skillName": "Digest", "cronExpression": "* * * * *" }),
        )
        .await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));

        let res = call(&app, methods::CREATE_TASK, json!({ "skillId": "s-1" })).await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));

        let res = call(&app, methods::LIST_TASKS, Value::Null).await;
        assert_eq!(res.payload.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn create_stores_parameters_and_creator() {
        let app = test_state();
        let res = call(
            &app,
            methods::CREATE_TASK,
            json!({
                "skillId": "s-1",
                "skillName": "Digest",
                "cronExpression": "*/15 * * * *",
                "parameters": { "repo": "acme/api" },
                "createdBy": "user-3"
            }),
        )
        .await;
        let task = res.payload.unwrap();
        assert!(task["id"].is_string());
        assert_eq!(task["skillId"], "s-1");
        assert_eq!(task["parameters"], r#"{"repo":"acme/api"}"#);
        assert_eq!(task["createdBy"], "user-3");
        assert_eq!(task["enabled"], true);
        assert_eq!(task["runCount"], 0);
        assert_eq!(task["nextRun"], "2026-01-09T10:15:00Z");
    }

    #[tokio::test]
    async fn update_then_get() {
        let app = test_state();
        let id = create(&app, "0 9 * * *").await;

        let res = call(
            &app,
            methods::UPDATE_TASK,
            json!({ "id": id, "cronExpression": "30 18 * * *", "enabled": false }),
        )
        .await;
        assert!(res.ok);
        assert_eq!(res.payload.unwrap(), json!({ "success": true }));

        let res = call(&app, methods::GET_TASK, json!({ "id": id })).await;
        let task = res.payload.unwrap();
        assert_eq!(task["id"], id.as_str());
        assert_eq!(task["cronExpression"], "30 18 * * *");
        assert_eq!(task["enabled"], false);
        assert_eq!(task["nextRun"], "2026-01-09T18:30:00Z");

        let res = call(&app, methods::UPDATE_TASK, json!({ "id": id, "cronExpression": "bad" })).await;
        assert_eq!(res.error_code(), Some("INVALID_EXPRESSION"));

        let res = call(&app, methods::UPDATE_TASK, json!({ "id": "ghost", "enabled": true })).await;
        assert_eq!(res.error_code(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn delete_and_mark_executed() {
        let app = test_state();
        let id = create(&app, "0 9 * * 1-5").await;

        let res = call(&app, methods::MARK_EXECUTED, json!({ "id": id })).await;
        assert_eq!(res.payload.unwrap(), json!({ "success": true }));
        let res = call(&app, methods::GET_TASK, json!({ "id": id })).await;
        let task = res.payload.unwrap();
        assert_eq!(task["runCount"], 1);
        assert_eq!(task["lastRun"], "2026-01-09T10:00:00Z");

        let res = call(&app, methods::DELETE_TASK, json!({ "id": id })).await;
        assert!(res.ok);
        let res = call(&app, methods::DELETE_TASK, json!({ "id": id })).await;
        assert_eq!(res.error_code(), Some("NOT_FOUND"));
        let res = call(&app, methods::MARK_EXECUTED, json!({ "id": id })).await;
        assert_eq!(res.error_code(), Some("NOT_FOUND"));
        let res = call(&app, methods::DELETE_TASK, json!({ "id": "" })).await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));
    }

    #[tokio::test]
    async fn upcoming_defaults_to_configured_window() {
        let app = test_state();
        create(&app, "0 9 * * *").await;

        let res = call(&app, methods::UPCOMING_TASKS, Value::Null).await;
        let p = res.payload.unwrap();
        let entries = p.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["task"]["cronExpression"], "0 9 * * *");
        assert_eq!(entries[0]["nextRuns"].as_array().map(Vec::len), Some(7));

        let res = call(&app, methods::UPCOMING_TASKS, json!({ "days": 2 })).await;
        let p = res.payload.unwrap();
        assert_eq!(p[0]["nextRuns"].as_array().map(Vec::len), Some(2));

        let res = call(&app, methods::UPCOMING_TASKS, json!({ "days": "soon" })).await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));
    }

    #[tokio::test]
    async fn upcoming_rejects_oversized_windows() {
        let app = test_state();
        create(&app, "0 9 * * *").await;

        for days in [json!(367), json!(4294967295u64)] {
            let res = call(&app, methods::UPCOMING_TASKS, json!({ "days": days })).await;
            assert!(!res.ok);
            assert_eq!(res.error_code(), Some("INVALID_PARAMS"));
        }

        let res = call(&app, methods::UPCOMING_TASKS, json!({ "days": 366 })).await;
        assert!(res.ok);
    }

    #[tokio::test]
    async fn calendar_events_over_three_days() {
        let app = test_state();
        let id = create(&app, "0 9 * * *").await;

        let res = call(
            &app,
            methods::CALENDAR_EVENTS,
            json!({ "start": "2026-01-10T00:00:00Z", "end": "2026-01-12T23:59:59Z" }),
        )
        .await;
        let payload = res.payload.unwrap();
        let events = payload.as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["start"], "2026-01-10T09:00:00Z");
        assert_eq!(events[0]["taskId"], id.as_str());
        assert_eq!(events[0]["title"], "Digest");
        assert_eq!(events[0]["skillId"], "s-1");
        assert_eq!(events[0]["id"], format!("{id}-1768035600000"));

        let res = call(
            &app,
            methods::CALENDAR_EVENTS,
            json!({ "start": "2026-01-12T00:00:00Z", "end": "2026-01-10T00:00:00Z" }),
        )
        .await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));

        let res = call(&app, methods::CALENDAR_EVENTS, json!({ "start": "tomorrow", "end": "later" })).await;
        assert_eq!(res.error_code(), Some("INVALID_PARAMS"));
    }

    #[tokio::test]
    async fn due_tasks_lists_nothing_before_first_run() {
        let app = test_state();
        create(&app, "0 9 * * *").await;
        let res = call(&app, methods::DUE_TASKS, Value::Null).await;
        assert_eq!(res.payload.unwrap(), json!([]));
    }
}
