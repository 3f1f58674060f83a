use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use diesel_async::{AsyncPgConnection, pooled_connection::deadpool::Pool};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod guestbook;
pub mod identity;
pub mod json;
pub mod schema;

use config::ServerConfig;
use guestbook::GuestBook;

#[derive(Clone)]
pub struct App {
    pub diesel: Pool<AsyncPgConnection>,
    pub config: Arc<ServerConfig>,
    pub guest_book: Arc<GuestBook>,
}

impl App {
    pub fn new(diesel: Pool<AsyncPgConnection>, config: ServerConfig) -> Self {
        App {
            diesel,
            config: Arc::new(config),
            guest_book: Arc::new(GuestBook::new()),
        }
    }
}

pub fn router(app: App) -> Router {
    let origins: Vec<HeaderValue> = app
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(error) => {
                tracing::warn!(%origin, %error, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .nest("/guest-book", guestbook::routes::route())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}
