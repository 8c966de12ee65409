use crate::aggregate::ParticipantAvailability;
use crate::error::AppError;
use crate::models::{Event, EventRow, NewEvent};
use crate::slot::SlotKey;
use chrono::NaiveDate;
use nanoid::nanoid;
use sqlx::SqlitePool;
use sqlx::types::Json;
use std::collections::BTreeMap;

pub const PUBLIC_ID_LEN: usize = 10;

pub async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            public_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            dates TEXT NOT NULL,
            start_hour INTEGER NOT NULL,
            end_hour INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS participants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (event_id) REFERENCES events (id) ON DELETE CASCADE,
            UNIQUE(event_id, name)
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS availability (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL,
            day DATE NOT NULL,
            hour INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (participant_id) REFERENCES participants (id) ON DELETE CASCADE,
            UNIQUE(participant_id, day, hour)
        );",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn into_event(row: EventRow) -> Result<Event, AppError> {
    let public_id = row.public_id.clone();
    Event::try_from(row).map_err(|e| AppError::Corrupt(format!("event {public_id}: {e}")))
}

/// Stores an already validated event under a fresh public id.
pub async fn create_event(pool: &SqlitePool, new_event: &NewEvent) -> Result<Event, AppError> {
    let public_id = nanoid!(PUBLIC_ID_LEN);
    let row: EventRow = sqlx::query_as(
        "INSERT INTO events (public_id, name, description, dates, start_hour, end_hour)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&public_id)
    .bind(&new_event.name)
    .bind(&new_event.description)
    .bind(Json(&new_event.dates))
    .bind(i64::from(new_event.start_hour))
    .bind(i64::from(new_event.end_hour))
    .fetch_one(pool)
    .await?;
    tracing::info!(%public_id, name = %new_event.name, "event created");
    into_event(row)
}

pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<Event>, AppError> {
    let rows: Vec<EventRow> =
        sqlx::query_as("SELECT * FROM events ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await?;
    rows.into_iter().map(into_event).collect()
}

pub async fn find_event(pool: &SqlitePool, public_id: &str) -> Result<Option<Event>, AppError> {
    let row: Option<EventRow> = sqlx::query_as("SELECT * FROM events WHERE public_id = ?")
        .bind(public_id)
        .fetch_optional(pool)
        .await?;
    row.map(into_event).transpose()
}

/// Makes `slots` the participant's complete availability for the event.
/// Whatever they had marked before is dropped in the same transaction.
pub async fn replace_availability(
    pool: &SqlitePool,
    event: &Event,
    participant: &str,
    slots: &BTreeMap<SlotKey, String>,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let (participant_id,): (i64,) = sqlx::query_as(
        "INSERT INTO participants (event_id, name) VALUES (?, ?)
         ON CONFLICT (event_id, name) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
         RETURNING id",
    )
    .bind(event.row_id)
    .bind(participant)
    .fetch_one(&mut *tx)
    .await?;

    let removed = sqlx::query("DELETE FROM availability WHERE participant_id = ?")
        .bind(participant_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    for (slot, note) in slots {
        sqlx::query(
            "INSERT INTO availability (participant_id, day, hour, note) VALUES (?, ?, ?, ?)",
        )
        .bind(participant_id)
        .bind(slot.date())
        .bind(i64::from(slot.hour()))
        .bind(note)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!(
        event = %event.public_id,
        participant,
        removed,
        inserted = slots.len(),
        "availability replaced"
    );
    Ok(())
}

/// Reads every participant of the event, in first-submission order, together
/// with the slots they marked. One query, so the roster and the marks come
/// from the same state of the database.
pub async fn load_snapshot(
    pool: &SqlitePool,
    event: &Event,
) -> Result<Vec<ParticipantAvailability>, AppError> {
    let rows: Vec<(i64, String, Option<NaiveDate>, Option<i64>, Option<String>)> =
        sqlx::query_as(
            "SELECT p.id, p.name, a.day, a.hour, a.note
             FROM participants p
             LEFT JOIN availability a ON a.participant_id = p.id
             WHERE p.event_id = ?
             ORDER BY p.id",
        )
        .bind(event.row_id)
        .fetch_all(pool)
        .await?;

    let mut snapshot: Vec<ParticipantAvailability> = Vec::new();
    let mut current_id = None;
    for (participant_id, name, day, hour, note) in rows {
        if current_id != Some(participant_id) {
            current_id = Some(participant_id);
            snapshot.push(ParticipantAvailability {
                name,
                slots: BTreeMap::new(),
            });
        }
        let (Some(day), Some(hour)) = (day, hour) else {
            continue;
        };
        let hour = u8::try_from(hour)
            .ok()
            .filter(|h| *h < 24)
            .ok_or_else(|| AppError::Corrupt(format!("availability row with hour {hour}")))?;
        if let Some(participant) = snapshot.last_mut() {
            participant
                .slots
                .insert(SlotKey::new(day, hour), note.unwrap_or_default());
        }
    }
    Ok(snapshot)
}

/// Drops the participant and, through the cascade, all of their marks.
pub async fn remove_participant(
    pool: &SqlitePool,
    event: &Event,
    participant: &str,
) -> Result<bool, AppError> {
    let removed = sqlx::query("DELETE FROM participants WHERE event_id = ? AND name = ?")
        .bind(event.row_id)
        .bind(participant)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(removed > 0)
}
