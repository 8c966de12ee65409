use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::{delete, get},
};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn create_router(app_state: AppState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route(
            "/events",
            get(handlers::get_events).post(handlers::create_event_handler),
        )
        .route("/events/{public_id}", get(handlers::get_event_details))
        .route("/events/{public_id}/heatmap", get(handlers::get_heatmap))
        .route(
            "/events/{public_id}/availability",
            get(handlers::get_availability)
                .put(handlers::submit_availability)
                .post(handlers::submit_availability),
        )
        .route(
            "/events/{public_id}/participants/{name}",
            delete(handlers::remove_participant_handler),
        );

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
