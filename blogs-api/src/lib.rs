use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod gate;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod storage;

use config::AppConfig;
use routes::{auth, blogs, categories, collections, comments, health, search, users};
use storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: AppConfig,
    /// Absent when no Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/healthz", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/users/profile", put(users::update_profile))
        .route("/users/follow/:user_id", post(users::toggle_follow))
        .route("/users/account", delete(users::delete_account))
        .route("/users/feeds", get(users::feed))
        .route("/search/users", get(search::users))
        .route("/search/blogs", get(search::blogs))
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/:id", put(categories::rename).delete(categories::remove))
        .route("/categories/:id/blogs", get(categories::blogs))
        .route("/blogs", get(blogs::mine).post(blogs::create))
        .route("/blogs/:id", get(blogs::show).put(blogs::update).delete(blogs::remove))
        .route("/blogs/:id/like", put(blogs::toggle_like))
        .route("/blogs/:id/comments", get(blogs::comments))
        .route("/collections", get(collections::list).post(collections::create))
        .route("/collections/:id", put(collections::rename).delete(collections::remove))
        .route(
            "/collections/:id/blogs",
            get(collections::blogs).post(collections::add_blog),
        )
        .route("/collections/:id/blogs/:blog_id", delete(collections::remove_blog))
        .route("/comments", post(comments::create))
        .route("/comments/:id", put(comments::update).delete(comments::remove))
        .route("/comments/:id/like", put(comments::toggle_like));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(health::metrics))
        .layer(axum::middleware::from_fn(
            blogs_shared::middleware::metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
