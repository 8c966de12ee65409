use crate::{
    aggregate::{self, AvailabilityView, Heatmap, ParticipantAvailability},
    db,
    error::{ApiJson, AppError},
    models::{self, AvailabilitySubmission, Event, NewEvent, SlotMark},
    slot::SlotKey,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

async fn load_event(pool: &SqlitePool, public_id: &str) -> Result<Event, AppError> {
    db::find_event(pool, public_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no event with id `{public_id}`")))
}

fn build_heatmap(event: &Event, snapshot: &[ParticipantAvailability]) -> Heatmap {
    let heatmap = aggregate::heatmap(event, snapshot);
    for (participant, slot) in &heatmap.ignored {
        tracing::warn!(
            event = %event.public_id,
            %participant,
            %slot,
            "stored slot lies outside the event grid, left out of the heat map"
        );
    }
    heatmap
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: String,
}

pub async fn health_check(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    match db::ping(&app_state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "connected".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: format!("error: {e}"),
                }),
            )
        }
    }
}

pub async fn get_events(State(app_state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    db::get_all_events(&app_state.pool).await.map(Json)
}

pub async fn create_event_handler(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let new_event = payload.validated()?;
    let event = db::create_event(&app_state.pool, &new_event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    event: Event,
    heatmap: Heatmap,
}

pub async fn get_event_details(
    State(app_state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<EventDetails>, AppError> {
    let event = load_event(&app_state.pool, &public_id).await?;
    let snapshot = db::load_snapshot(&app_state.pool, &event).await?;
    let heatmap = build_heatmap(&event, &snapshot);
    Ok(Json(EventDetails { event, heatmap }))
}

pub async fn get_heatmap(
    State(app_state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<Heatmap>, AppError> {
    let event = load_event(&app_state.pool, &public_id).await?;
    let snapshot = db::load_snapshot(&app_state.pool, &event).await?;
    Ok(Json(build_heatmap(&event, &snapshot)))
}

pub async fn get_availability(
    State(app_state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<AvailabilityView>, AppError> {
    let event = load_event(&app_state.pool, &public_id).await?;
    let snapshot = db::load_snapshot(&app_state.pool, &event).await?;
    Ok(Json(aggregate::participant_view(&snapshot)))
}

#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    participant: String,
    slots: BTreeMap<SlotKey, SlotMark>,
}

pub async fn submit_availability(
    State(app_state): State<AppState>,
    Path(public_id): Path<String>,
    ApiJson(payload): ApiJson<AvailabilitySubmission>,
) -> Result<Json<SubmissionReceipt>, AppError> {
    let event = load_event(&app_state.pool, &public_id).await?;
    let submission = payload.validate(&event).inspect_err(|e| {
        tracing::info!(event = %event.public_id, error = %e, "availability submission rejected");
    })?;

    db::replace_availability(&app_state.pool, &event, &submission.participant, &submission.slots)
        .await?;

    let stored = ParticipantAvailability {
        name: submission.participant,
        slots: submission.slots,
    };
    Ok(Json(SubmissionReceipt {
        slots: aggregate::marks_of(&stored),
        participant: stored.name,
    }))
}

pub async fn remove_participant_handler(
    State(app_state): State<AppState>,
    Path((public_id, name)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let event = load_event(&app_state.pool, &public_id).await?;
    let name = models::normalize_participant(&name)?;
    if db::remove_participant(&app_state.pool, &event, &name).await? {
        tracing::info!(event = %event.public_id, participant = %name, "participant removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("`{name}` has not submitted availability")))
    }
}
