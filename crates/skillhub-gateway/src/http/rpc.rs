//! RPC endpoint: POST /rpc.
//!
//! The body is a single request frame; the reply is always a response frame
//! carrying the same id. Method-level failures travel inside the frame with
//! HTTP 200; only an unreadable body gets a 4xx status.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use skillhub_protocol::frames::{ReqFrame, ResFrame};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::rpc::dispatch;

pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReqFrame>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection, "malformed rpc body");
            let res = ResFrame::err("", "INVALID_PARAMS", &rejection.body_text());
            return (rejection.status(), Json(res)).into_response();
        }
    };

    if !req.is_req() {
        warn!(id = %req.id, frame_type = %req.frame_type, "non-request frame on /rpc");
        let res = ResFrame::err(&req.id, "INVALID_PARAMS", "expected a frame of type 'req'");
        return Json(res).into_response();
    }

    debug!(id = %req.id, method = %req.method, "rpc call");
    let res = dispatch::route(&req.method, req.params.as_ref(), &req.id, &state).await;
    Json(res).into_response()
}
