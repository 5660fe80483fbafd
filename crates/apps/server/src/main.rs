mod admin;
mod error;
mod reads;
mod save;
mod state;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use http::Method;
use persistence::{LoreBackend, MemoryBackend, RpcBackend, MASTER_WALLET};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::state::{open_cache, AdminPolicy, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("LORE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()
        .expect("invalid LORE_ADDR");

    let backend: Arc<dyn LoreBackend> =
        match (env::var("LORE_BACKEND_URL"), env::var("LORE_BACKEND_KEY")) {
            (Ok(url), Ok(key)) => {
                let timeout = Duration::from_secs(env_var_u64("LORE_BACKEND_TIMEOUT_SECS", 15));
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .unwrap_or_else(|err| {
                        warn!("failed to configure backend client: {err}");
                        reqwest::Client::new()
                    });
                info!("using hosted backend at {url}");
                Arc::new(RpcBackend::with_client(http, url, key))
            }
            _ if env_flag("LORE_SEED_DEFAULTS") => {
                info!("using in-memory backend seeded with the default universes");
                Arc::new(MemoryBackend::seeded())
            }
            _ => {
                info!("using empty in-memory backend");
                Arc::new(MemoryBackend::new())
            }
        };

    let admin = AdminPolicy {
        require_admin: env_flag("LORE_REQUIRE_ADMIN"),
        master_wallet: env::var("LORE_MASTER_WALLET")
            .unwrap_or_else(|_| MASTER_WALLET.to_string()),
    };
    let cache = open_cache(env::var("LORE_CACHE_DIR").ok().as_deref());
    let state = AppState::new(backend, cache, admin);

    let app = router(state);

    info!("lore server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/save-data",
            post(save::save_data).fallback(save::method_not_allowed),
        )
        .route("/api/regions", get(reads::list_regions))
        .route("/api/regions/:id", get(reads::get_region))
        .route("/api/config", get(reads::get_config))
        .route("/api/codex", get(reads::list_codex))
        .route("/api/codex/timeline", get(reads::codex_timeline))
        .route("/api/codex/:entry_id", get(reads::get_codex_entry))
        .route(
            "/api/locations/:location_id/codex",
            get(reads::location_codex),
        )
        .route("/api/admin/check", get(admin::check_wallet))
        .route(
            "/api/admin/regions/:id",
            put(admin::put_region).delete(admin::delete_region),
        )
        .route(
            "/api/admin/locations/:id",
            put(admin::put_location).delete(admin::delete_location),
        )
        .route("/api/admin/config", put(admin::put_config))
        .route(
            "/api/admin/codex/:entry_id",
            put(admin::put_codex).delete(admin::delete_codex),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::state::test_state;

    use super::*;

    #[tokio::test]
    async fn healthz_answers_ok() {
        let app = router(test_state(Arc::new(MemoryBackend::new()), false));
        let resp = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn preflight_allows_cross_origin_writes() {
        let app = router(test_state(Arc::new(MemoryBackend::new()), false));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/save-data")
                    .header("origin", "https://lore.example.test")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
