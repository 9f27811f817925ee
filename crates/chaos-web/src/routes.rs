use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::middleware;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chaos_core::service::runbook_delay;
use chaos_core::types::ChaosMode;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::cors::allow_any_origin;
use crate::error::WebError;
use crate::model::{
    web_event_name, ChaosRequest, ChaosResponse, HealthResponse, LogsResponse, ResetResponse,
    RootResponse, StateView, DEMO_SERVICE_NAME,
};
use crate::state::WebState;

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/logs", get(logs))
        .route("/state", get(service_state))
        .route("/events", get(stream_events))
        .route("/admin/chaos", post(trigger_chaos))
        .route("/admin/reset", post(reset))
        .layer(middleware::from_fn(allow_any_origin))
        .with_state(state)
}

async fn index(State(state): State<WebState>) -> Json<RootResponse> {
    Json(RootResponse {
        service: DEMO_SERVICE_NAME.to_string(),
        status: state.status().await,
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn logs(State(state): State<WebState>) -> Json<LogsResponse> {
    Json(LogsResponse {
        logs: state.logs().await,
    })
}

async fn service_state(State(state): State<WebState>) -> Json<StateView> {
    let snapshot = state.snapshot().await;
    Json(StateView::from(&snapshot))
}

async fn trigger_chaos(
    State(state): State<WebState>,
    payload: Result<Json<ChaosRequest>, JsonRejection>,
) -> Result<Json<ChaosResponse>, WebError> {
    let Json(request) = payload.map_err(|rejection| WebError::BadRequest {
        message: rejection.body_text(),
    })?;
    let mode = request.mode.parse::<ChaosMode>()?;
    let delay = match request.auto_runbook_delay {
        Some(secs) => runbook_delay(secs)?,
        None => state.default_delay(),
    };

    let triggered = state.trigger_chaos(mode, delay).await?;
    Ok(Json(ChaosResponse {
        ok: true,
        mode,
        incident_id: triggered.incident,
        auto_runbook_delay: delay.as_secs_f64(),
    }))
}

async fn reset(State(state): State<WebState>) -> Json<ResetResponse> {
    let outcome = state.reset().await;
    Json(ResetResponse {
        ok: true,
        closed_incident: outcome.closed,
    })
}

async fn stream_events(
    State(state): State<WebState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).map(|message| {
        let event = match message {
            Ok(payload) => {
                let data = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
                SseEvent::default()
                    .event(web_event_name(&payload.kind))
                    .data(data)
            }
            Err(_) => SseEvent::default().event("lagged").data("{}"),
        };
        Ok::<SseEvent, Infallible>(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keepalive"),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::body::BodyDataStream;
    use axum::Router;
    use chaos_core::config::{DemoConfig, RetriggerPolicy};
    use chaos_core::types::ChaosMode;
    use serde_json::Value;
    use tokio_stream::StreamExt;
    use tower::ServiceExt;

    use super::router;
    use crate::state::WebState;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    #[tokio::test(start_paused = true)]
    async fn health_reports_liveness_only() {
        let app = router(WebState::default());
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_scenario_recovers_after_runbook_delay() {
        let app = router(WebState::default());

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "timeout", "auto_runbook_delay": 8 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["mode"], "timeout");
        assert_eq!(body["auto_runbook_delay"], 8.0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let (_, state) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(state["status"], "chaos");
        assert_eq!(state["chaos_mode"], "timeout");
        assert!(state["incident_start"].is_string());
        assert!(state["mtttr_seconds"].is_null());
        assert!(state["speedup"].is_null());

        tokio::time::sleep(Duration::from_secs(8)).await;
        let (_, state) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(state["status"], "healthy");
        assert!(state["chaos_mode"].is_null());
        assert_eq!(state["manual_mtttr_minutes"], 47);
        let mttr = state["mtttr_seconds"].as_f64().expect("mttr");
        assert!((mttr - 8.0).abs() < 0.01, "mttr was {mttr}");
        let speedup = state["speedup"].as_f64().expect("speedup");
        assert!((speedup - 352.5).abs() < 0.5, "speedup was {speedup}");
        assert_eq!(state["resolution"], "automated");
        let logs = state["logs"].as_array().expect("logs array");
        assert!(!logs.is_empty() && logs.len() <= 5);
    }

    async fn next_frame(body: &mut BodyDataStream) -> String {
        let chunk = body
            .next()
            .await
            .expect("stream open")
            .expect("frame");
        String::from_utf8(chunk.to_vec()).expect("utf8 frame")
    }

    #[tokio::test(start_paused = true)]
    async fn events_stream_names_lifecycle_events_and_keeps_alive() {
        let state = WebState::default();
        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/events")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .expect("content type")
            .starts_with("text/event-stream"));
        let mut body = response.into_body().into_data_stream();

        let triggered = state
            .trigger_chaos(ChaosMode::Timeout, Duration::from_secs(8))
            .await
            .expect("trigger");

        let frame = next_frame(&mut body).await;
        assert!(frame.contains("event: chaos_triggered"), "frame was {frame:?}");
        assert!(frame.contains("\"mode\":\"timeout\""));

        let frame = next_frame(&mut body).await;
        assert!(frame.contains("event: runbook_completed"), "frame was {frame:?}");
        assert!(frame.contains(&format!("\"incident_id\":{}", triggered.incident.0)));

        let frame = next_frame(&mut body).await;
        assert!(frame.contains("keepalive"), "frame was {frame:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn reject_policy_refuses_trigger_while_in_chaos() {
        let mut config = DemoConfig::default();
        config.runbook.retrigger = RetriggerPolicy::Reject;
        let app = router(WebState::new(&config));

        let (status, _) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "timeout" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "random_crash" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("already in chaos"));

        let (_, state) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(state["status"], "chaos");
        assert_eq!(state["chaos_mode"], "timeout");
        assert_eq!(state["incident_id"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_mode_is_rejected_and_state_unchanged() {
        let app = router(WebState::default());
        let (_, before) = send(&app, Method::GET, "/logs", None).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "meteor_strike" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid chaos mode: meteor_strike");

        let (_, state) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(state["status"], "healthy");
        let (_, after) = send(&app, Method::GET, "/logs", None).await;
        assert_eq!(after, before);
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_delay_is_rejected() {
        let app = router(WebState::default());
        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "timeout", "auto_runbook_delay": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("auto_runbook_delay"));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_body_is_a_bad_request() {
        let app = router(WebState::default());
        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "timeout", "auto_runbook_delay": "soon" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_always_succeeds_and_cancels_runbook() {
        let app = router(WebState::default());
        let (status, body) = send(&app, Method::POST, "/admin/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(body["closed_incident"].is_null());

        send(
            &app,
            Method::POST,
            "/admin/chaos",
            Some(serde_json::json!({ "mode": "random_crash" })),
        )
        .await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        let (_, body) = send(&app, Method::POST, "/admin/reset", None).await;
        assert_eq!(body["closed_incident"], 1);
        let (_, logs_after_reset) = send(&app, Method::GET, "/logs", None).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        let (_, logs_later) = send(&app, Method::GET, "/logs", None).await;
        assert_eq!(logs_later, logs_after_reset);
        let (_, state) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(state["resolution"], "manual");
        assert!(state["speedup"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn logs_are_capped_at_five_most_recent_last() {
        let app = router(WebState::default());
        for mode in ["timeout", "connection_pool", "random_crash", "timeout"] {
            send(
                &app,
                Method::POST,
                "/admin/chaos",
                Some(serde_json::json!({ "mode": mode })),
            )
            .await;
            send(&app, Method::POST, "/admin/reset", None).await;
        }

        let (_, body) = send(&app, Method::GET, "/logs", None).await;
        let logs = body["logs"].as_array().expect("logs array");
        assert_eq!(logs.len(), 5);
        let last = logs.last().expect("last entry");
        assert_eq!(last["severity"], "INFO");
        assert!(last["message"]
            .as_str()
            .expect("message")
            .starts_with("Manual reset"));
        assert!(last["timestamp"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn responses_allow_any_origin_and_answer_preflight() {
        let app = router(WebState::default());
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/state")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/admin/chaos")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "content-type"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn index_names_the_service() {
        let app = router(WebState::default());
        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "payment-service-demo");
        assert_eq!(body["status"], "healthy");
    }
}
