pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::SessionManager;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{seed, Backends, DatabaseManager, Storage};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub sessions: SessionManager,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(backends: Backends, config: AppConfig) -> anyhow::Result<Self> {
        let sessions = SessionManager::new(&backends, &config.security)?;
        Ok(Self {
            storage: backends.storage,
            sessions,
            config: Arc::new(config),
        })
    }

    /// Connect the configured backend, apply seeding and build the state
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let backends = DatabaseManager::connect(&config.database).await?;
        if config.seed.doctors {
            seed::seed_doctors(backends.storage.as_ref()).await?;
        }
        Self::new(backends, config)
    }
}

pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let request_logging = state.config.api.enable_request_logging;
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn api_routes() -> Router<AppState> {
    use handlers::{elevated, protected, public};

    Router::new()
        // Session management
        .route("/api/register", post(public::auth::register))
        .route("/api/login", post(public::auth::login))
        .route("/api/logout", post(public::auth::logout))
        .route("/api/user", get(protected::user::current))
        // Doctors: anyone reads, admins write
        .route(
            "/api/doctors",
            get(public::doctors::list).post(elevated::doctors::create),
        )
        .route("/api/doctors/:id", get(public::doctors::show))
        // Appointments
        .route(
            "/api/appointments",
            get(protected::appointments::list).post(protected::appointments::create),
        )
        .route(
            "/api/appointments/:id/status",
            patch(elevated::appointments::update_status),
        )
        // Reports
        .route(
            "/api/reports",
            get(protected::reports::list).post(elevated::reports::create),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if security.cors_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Hospital API",
        "version": version,
        "description": "Patients, doctors, appointments and medical reports",
        "endpoints": {
            "session": "/api/register, /api/login, /api/logout, /api/user",
            "doctors": "/api/doctors[/:id] (read public, create admin)",
            "appointments": "/api/appointments, /api/appointments/:id/status (admin)",
            "reports": "/api/reports (read own, create admin)",
            "health": "/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.storage.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = AppState::new(Backends::memory(), AppConfig::in_memory()).unwrap();
        app(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok_for_memory_store() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["database"], "ok");
    }

    #[tokio::test]
    async fn unauthenticated_user_is_401() {
        let response = test_app()
            .oneshot(Request::get("/api/user").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_json(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn unknown_doctor_is_empty_404() {
        for path in ["/api/doctors/999", "/api/doctors/abc"] {
            let response = test_app()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let response = test_app()
            .oneshot(
                Request::post("/api/register")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_JSON");
    }

    fn register_request(username: &str) -> Request<Body> {
        Request::post("/api/register")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "username": username,
                    "password": "secret",
                    "name": "Load Test",
                    "email": "load@example.com"
                })
                .to_string(),
            ))
            .unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn runtime_keeps_ticking_while_registering() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{Duration, Instant};

        let app = test_app();
        let worst_gap_ms = Arc::new(AtomicU64::new(0));

        let start = Instant::now();
        let ticker = {
            let worst_gap_ms = worst_gap_ms.clone();
            tokio::spawn(async move {
                let mut last = start;
                loop {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    let now = Instant::now();
                    let gap = now.duration_since(last).as_millis() as u64;
                    worst_gap_ms.fetch_max(gap, Ordering::Relaxed);
                    last = now;
                }
            })
        };

        for username in ["load1", "load2", "load3"] {
            let response = app.clone().oneshot(register_request(username)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        ticker.abort();

        let worst = worst_gap_ms.load(Ordering::Relaxed);
        assert!(worst < 500, "timer stalled for {}ms during registration", worst);
    }

    #[tokio::test]
    async fn register_sets_session_cookie() {
        let response = test_app()
            .oneshot(
                Request::post("/api/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "username": "jdoe",
                            "password": "secret",
                            "name": "John Doe",
                            "email": "john@example.com"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("hospital_session="));

        let user = body_json(response).await;
        assert_eq!(user["role"], "patient");
        assert!(user.get("password").is_none());
    }
}
