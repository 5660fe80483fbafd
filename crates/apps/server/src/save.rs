//! `POST /api/save-data`: the admin console's whole-map save.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use formats::save_request::SaveRequest;
use persistence::{save_all, BulkReport};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{json_body, ApiError, UNAUTHORIZED_MESSAGE};
use crate::state::AppState;

pub const SAVED_MESSAGE: &str = "Data saved successfully";
pub const SAVE_FAILED: &str = "Failed to save data";

pub async fn save_data(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match json_body(&body).and_then(|v| {
        SaveRequest::parse(&v).map_err(|e| ApiError::bad_request(e.to_string()))
    }) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected save request");
            return err.into_response();
        }
    };
    if let Err(err) = state.require_admin(&headers).await {
        return err.into_response();
    }

    info!(regions = request.regions.len(), "saving map");
    let report = save_all(state.backend.as_ref(), &request).await;
    report_response(report)
}

/// Renders a save report: 200 when every item landed, 401 when the backend
/// refused the caller, 500 otherwise.
pub fn report_response(report: BulkReport) -> Response {
    if report.is_complete() {
        return (
            StatusCode::OK,
            Json(json!({ "success": true, "message": SAVED_MESSAGE, "report": report })),
        )
            .into_response();
    }
    let (status, error) = if report.is_unauthorized() {
        (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            report.first_error().unwrap_or(SAVE_FAILED).to_string(),
        )
    };
    (
        status,
        Json(json!({ "success": false, "error": error, "report": report })),
    )
        .into_response()
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "success": false, "error": "Method not allowed" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use persistence::{ErrorKind, LoreBackend, MemoryBackend, MASTER_WALLET};
    use scene::ids::{LocationId, UniverseId};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::router;
    use crate::state::{test_state, WALLET_HEADER};

    fn post(body: &str) -> Request<Body> {
        Request::post("/api/save-data")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    const SAVE_BODY: &str = r##"{
        "config": { "multiverseBackgroundUrl": "/v.mp4" },
        "regions": [{ "id": "u1", "name": "Alpha", "color": "#fff", "cx": 10, "cy": 20,
            "locations": [{ "id": "l1", "name": "Outpost", "cx": 11, "cy": 21, "type": "station" }] }]
    }"##;

    #[tokio::test]
    async fn saves_regions_locations_and_config() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, body) = send(router(test_state(backend.clone(), false)), post(SAVE_BODY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], SAVED_MESSAGE);

        let map = backend.fetch_regions().await.unwrap();
        let u1 = map.universe(&UniverseId::from("u1")).unwrap();
        assert_eq!(u1.locations.len(), 1);
        assert_eq!(u1.locations[0].id, LocationId::from("l1"));
        let config = backend.fetch_config().await.unwrap().unwrap();
        assert_eq!(config.multiverse_background_url, "/v.mp4");
    }

    #[tokio::test]
    async fn non_list_regions_are_rejected_before_any_write() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, body) = send(
            router(test_state(backend.clone(), false)),
            post(r#"{ "regions": "not-an-array" }"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "Invalid regions data" }));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn location_claimed_by_two_universes_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, body) = send(
            router(test_state(backend.clone(), false)),
            post(
                r#"{ "regions": [
                    { "id": "u1", "cx": 0, "cy": 0, "locations": [{ "id": "l1", "cx": 1, "cy": 1 }] },
                    { "id": "u2", "cx": 5, "cy": 5, "locations": [{ "id": "l1", "cx": 6, "cy": 6 }] }
                ] }"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let app = router(test_state(Arc::new(MemoryBackend::new()), false));
        let (status, body) = send(
            app,
            Request::get("/api/save-data").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn backend_refusal_maps_to_401() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_with(ErrorKind::Backend, "Unauthorized: admin only");
        let (status, body) = send(router(test_state(backend, false)), post(SAVE_BODY)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], UNAUTHORIZED_MESSAGE);
        assert_eq!(body["report"]["failed"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_failures_map_to_500_with_the_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_with(ErrorKind::Network, "connection reset");
        let (status, body) = send(router(test_state(backend, false)), post(SAVE_BODY)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "connection reset");
    }

    #[tokio::test]
    async fn admin_gate_checks_the_wallet_header() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, _) = send(router(test_state(backend.clone(), true)), post(SAVE_BODY)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(backend.write_count(), 0);

        let mut req = post(SAVE_BODY);
        req.headers_mut()
            .insert(WALLET_HEADER, MASTER_WALLET.to_lowercase().parse().unwrap());
        let (status, _) = send(router(test_state(backend.clone(), true)), req).await;
        assert_eq!(status, StatusCode::OK);
    }
}
