use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod health;
pub mod notifications;
pub mod permit_letters;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/device-token", patch(auth::update_device_token));

    let permit_letter_routes = Router::new()
        .route("/", get(permit_letters::list_permit_letters))
        .route("/upload", post(permit_letters::upload_permit_letter))
        .route("/latest", get(permit_letters::latest_permit_letter))
        .route("/pending", get(permit_letters::pending_permit_letters))
        .route("/approved", get(permit_letters::approved_permit_letters))
        .route("/rejected", get(permit_letters::rejected_permit_letters))
        .route("/release", get(permit_letters::released_permit_letters))
        .route("/search", get(permit_letters::search_permit_letters))
        .route("/:id", get(permit_letters::get_permit_letter))
        .route("/edit/:id", put(permit_letters::update_permit_letter))
        .route("/delete/:id", delete(permit_letters::delete_permit_letter));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/:id", get(notifications::get_notification))
        .route("/:id/read", patch(notifications::mark_notification_read))
        .route("/delete/:id", delete(notifications::delete_notification));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/permit-letters", permit_letter_routes)
        .nest("/api/notifications", notification_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
