use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matricula_api=debug,tower_http=info".into()),
        )
        .init();

    let config = crate::config::config();
    tracing::info!("Starting matricula-api in {:?} mode", config.environment);

    if config.database.run_migrations {
        match database::manager::DatabaseManager::migrate().await {
            Ok(()) => {
                if let Ok(pool) = database::manager::DatabaseManager::pool().await {
                    if let Err(e) = services::user_service::ensure_bootstrap_admin(&pool).await {
                        tracing::warn!("Bootstrap admin not created: {}", e);
                    }
                }
            }
            Err(e) => tracing::warn!("Migrations not applied at startup: {}", e),
        }
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("MATRICULA_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("matricula-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind the JWT middleware
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;
    use handlers::{auth, users};

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/professors", get(users::list_professors))
}

fn api_routes() -> Router {
    use axum::routing::{delete, post};
    use handlers::{auth, enrollments, schedules, sections, subjects, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/users/:id/roles", post(users::assign_role))
        .route("/api/users/:id/roles/:role", delete(users::remove_role))
        .route("/api/subjects", get(subjects::list).post(subjects::create))
        .route(
            "/api/subjects/:id",
            get(subjects::get).put(subjects::update).delete(subjects::delete),
        )
        .route("/api/schedules", get(schedules::list).post(schedules::create))
        .route(
            "/api/schedules/:id",
            get(schedules::get).put(schedules::update).delete(schedules::delete),
        )
        .route("/api/sections", get(sections::list).post(sections::create))
        .route(
            "/api/sections/:id",
            get(sections::get).put(sections::update).delete(sections::delete),
        )
        .route(
            "/api/enrollments",
            get(enrollments::list).post(enrollments::enroll),
        )
        .route("/api/enrollments/me", get(enrollments::list_mine))
        .route(
            "/api/enrollments/:id",
            get(enrollments::get).delete(enrollments::withdraw),
        )
        .layer(axum::middleware::from_fn(
            crate::middleware::auth::jwt_auth_middleware,
        ))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "matricula-api",
            "version": version,
            "description": "Student enrollment backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/refresh (public), /api/auth/whoami (protected)",
                "professors": "/professors (public)",
                "users": "/api/users[/:id] (admin)",
                "subjects": "/api/subjects[/:id] (protected)",
                "schedules": "/api/schedules[/:id] (protected)",
                "sections": "/api/sections[/:id] (protected)",
                "enrollments": "/api/enrollments[/:id], /api/enrollments/me (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
