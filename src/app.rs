use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{JwtAuthority, TokenVerifier};
use crate::config::{AppConfig, StorageBackend};
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_account_middleware};
use crate::storage::BlobStore;

/// Process-scoped dependencies, built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub tokens: Arc<JwtAuthority>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig, blobs: Arc<dyn BlobStore>) -> Self {
        let tokens = Arc::new(JwtAuthority::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        ));
        let verifier: Arc<dyn TokenVerifier> = tokens.clone();

        Self {
            db,
            config: Arc::new(config),
            verifier,
            tokens,
            blobs,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(user_routes())
        .merge(note_routes())
        .merge(contact_routes())
        .merge(file_routes())
        // Layers run bottom-up: token first, then the account lookup.
        .route_layer(from_fn_with_state(state.clone(), validate_account_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(public::auth::login_post))
        .route("/users", post(public::users::signup_post))
        .merge(protected);

    if state.config.storage.backend == StorageBackend::Local {
        let dir = state.config.storage.root_dir.join(&state.config.storage.container);
        app = app.nest_service("/blobs", ServeDir::new(dir));
    }

    let config = state.config.clone();
    let app = app
        .layer(DefaultBodyLimit::max(config.api.max_upload_size_bytes))
        .layer(cors_layer(&config));

    let app = if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.with_state(state)
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/users", get(users::users_list))
        .route(
            "/users/:id",
            get(users::user_get).put(users::user_put).delete(users::user_delete),
        )
        .route("/users/:id/image", post(users::user_image_post))
}

fn note_routes() -> Router<AppState> {
    use protected::notes;

    Router::new()
        .route("/notes", get(notes::notes_list).post(notes::notes_post))
        .route(
            "/notes/:id",
            get(notes::note_get).put(notes::note_put).delete(notes::note_delete),
        )
}

fn contact_routes() -> Router<AppState> {
    use protected::contacts;

    Router::new()
        .route("/contacts", get(contacts::contacts_list).post(contacts::contacts_post))
        .route(
            "/contacts/:id",
            get(contacts::contact_get)
                .put(contacts::contact_put)
                .delete(contacts::contact_delete),
        )
}

fn file_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::files;

    Router::new()
        .route("/files", get(files::list))
        .route("/files/upload", post(files::upload))
        .route("/files/:filename", delete(files::delete))
}

/// An empty origin list allows any origin in development and none elsewhere.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if config.is_development() {
            return CorsLayer::permissive();
        }
        tracing::warn!("CORS_ORIGINS is empty; cross-origin requests will be refused");
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Notes API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/login (public)",
                "users": "POST /users (public), /users[/:id[/image]] (protected)",
                "notes": "/notes[/:id] (protected)",
                "contacts": "/contacts[/:id] (protected)",
                "files": "/files, /files/upload, /files/:filename (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
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

    use crate::config::Environment;
    use crate::storage::MemoryBlobStore;

    fn test_router() -> Router {
        router_for(AppConfig::for_environment(Environment::Development))
    }

    fn router_for(mut config: AppConfig) -> Router {
        config.database.url = "postgres://nobody@127.0.0.1:9/unreachable".to_string();
        config.security.jwt_secret = "unit-test-secret".to_string();
        let pool = DatabaseManager::connect_lazy(&config.database).expect("lazy pool");
        router(AppState::new(pool, config, Arc::new(MemoryBlobStore::new("/blobs"))))
    }

    #[test]
    fn cors_accepts_configured_origins() {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.cors_origins = vec!["https://notes.example.com".into(), "not a header\n".into()];
        // Building must not panic with credentials + an explicit list.
        let _ = cors_layer(&config);

        config.security.cors_origins.clear();
        let _ = cors_layer(&config);
    }

    async fn preflight_allow_origin(config: AppConfig) -> Option<String> {
        let response = router_for(config)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/notes")
                    .header(header::ORIGIN, "https://evil.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[tokio::test]
    async fn empty_origin_list_is_open_only_in_development() {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.cors_origins.clear();
        assert_eq!(preflight_allow_origin(config).await.as_deref(), Some("*"));

        for environment in [Environment::Staging, Environment::Production] {
            let config = AppConfig::for_environment(environment);
            assert!(config.security.cors_origins.is_empty());
            assert_eq!(preflight_allow_origin(config).await, None);
        }
    }

    #[tokio::test]
    async fn configured_origin_is_echoed() {
        let mut config = AppConfig::for_environment(Environment::Production);
        config.security.cors_origins = vec!["https://evil.example".to_string()];
        assert_eq!(
            preflight_allow_origin(config).await.as_deref(),
            Some("https://evil.example")
        );
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token() {
        let response = test_router()
            .oneshot(Request::builder().uri("/notes").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
