use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, Uri},
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use mindfulspace_api::config::{config, Environment};
use mindfulspace_api::error::ApiError;
use mindfulspace_api::database::{seed, DatabaseManager};
use mindfulspace_api::handlers::{elevated, protected, public};
use mindfulspace_api::middleware::{jwt_auth_middleware, require_admin_middleware, require_coach_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mindfulspace_api=info,tower_http=info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting MindfulSpace API in {:?} mode", config.environment);

    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::warn!("Skipping migrations: {}", e);
        }
    }
    if config.database.seed_catalog {
        if let Err(e) = seed::seed_catalog().await {
            tracing::warn!("Skipping catalog seed: {}", e);
        }
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("MindfulSpace API listening on http://{}", bind_addr);

    axum::serve(listener, app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

fn app() -> Router {
    let config = config();

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(catalog_public_routes())
        // Protected API
        .merge(protected_routes())
        // Elevated API
        .merge(coach_routes())
        .merge(root_routes())
        .fallback(not_found)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
}

fn cors_layer() -> CorsLayer {
    let config = config();
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if matches!(config.environment, Environment::Development) {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn catalog_public_routes() -> Router {
    use public::{catalog, exercise, meditation, programs};

    Router::new()
        .route("/meditation/types", get(meditation::types_get))
        .route("/meditation/contents", get(meditation::contents_get))
        .route("/exercise/contents", get(exercise::contents_get))
        .route("/programs", get(programs::programs_get))
        .route("/programs/:id", get(programs::program_get))
        .route("/categories", get(catalog::categories_get))
        .route("/resources", get(catalog::resources_get))
        .route("/resources/:slug", get(catalog::resource_get))
}

fn protected_routes() -> Router {
    use protected::{auth, badges, exercise, media, meditation, programs, sleep, world};

    Router::new()
        // Account
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/users/me", patch(auth::me_patch).delete(auth::me_delete))
        // Trackers
        .route("/api/sleep", post(sleep::sleep_post).get(sleep::sleep_list))
        .route("/api/sleep/summary", get(sleep::sleep_summary))
        .route("/api/sleep/:id", get(sleep::sleep_get).delete(sleep::sleep_delete))
        .route("/api/meditation", post(meditation::meditation_post).get(meditation::meditation_list))
        .route("/api/meditation/summary", get(meditation::meditation_summary))
        .route("/api/meditation/:id", delete(meditation::meditation_delete))
        .route("/api/exercise", post(exercise::exercise_post).get(exercise::exercise_list))
        .route("/api/exercise/summary", get(exercise::exercise_summary))
        .route("/api/exercise/:id", delete(exercise::exercise_delete))
        // Programs
        .route("/api/programs/:id/subscribe", post(programs::subscribe_post))
        .route("/api/user-programs", get(programs::user_programs_get))
        .route(
            "/api/user-programs/:id",
            get(programs::user_program_get).delete(programs::user_program_delete),
        )
        .route("/api/user-programs/:id/days/:day/complete", post(programs::day_complete_post))
        // Badges, hub, media
        .route("/api/badges", get(badges::badges_get))
        .route("/api/badges/me", get(badges::badges_me_get))
        .route("/api/world/overview", get(world::overview_get))
        .route("/api/media/soundcloud", get(media::soundcloud_get))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn coach_routes() -> Router {
    use elevated::coach::{catalog, exercise, meditation, programs};

    Router::new()
        .route("/api/coach/meditation/contents", post(meditation::contents_post))
        .route("/api/coach/exercise/contents", post(exercise::contents_post))
        .route("/api/coach/programs", post(programs::programs_post))
        .route("/api/coach/categories", post(catalog::categories_post))
        .route("/api/coach/categories/:id/translations", post(catalog::category_translations_post))
        .route("/api/coach/resources", post(catalog::resources_post))
        // Layers run bottom-up: authenticate, then check the role
        .route_layer(from_fn(require_coach_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn root_routes() -> Router {
    use elevated::root;

    Router::new()
        .route("/api/root/users/:id/role", put(root::user_role_put))
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "MindfulSpace API",
            "version": version,
            "description": "Wellness tracking backend: sleep, meditation, exercise, programs and badges",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login, /auth/refresh (public - token acquisition)",
                "catalog": "/meditation/*, /exercise/contents, /programs[/:id], /categories, /resources[/:slug] (public)",
                "account": "/api/auth/whoami, /api/users/me (protected)",
                "trackers": "/api/sleep, /api/meditation, /api/exercise [/summary, /:id] (protected)",
                "programs": "/api/programs/:id/subscribe, /api/user-programs/* (protected)",
                "badges": "/api/badges[/me] (protected)",
                "world": "/api/world/overview (protected)",
                "media": "/api/media/soundcloud (protected)",
                "coach": "/api/coach/* (coach or admin)",
                "root": "/api/root/* (admin)",
            }
        }
    }))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    async fn json_of(method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_is_public() {
        assert_eq!(status_of("GET", "/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn tiers_are_gated_by_token() {
        assert_eq!(status_of("GET", "/api/sleep").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("POST", "/api/coach/programs").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("PUT", "/api/root/users/00000000-0000-0000-0000-000000000000/role").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        assert_eq!(status_of("DELETE", "/auth/login").await, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_path_id_uses_error_envelope() {
        let (status, body) = json_of("GET", "/programs/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_route_uses_error_envelope() {
        let (status, body) = json_of("GET", "/api/programs/x").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
