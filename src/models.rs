use crate::slot::SlotKey;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

pub const MAX_EVENT_NAME_LEN: usize = 120;
pub const MAX_EVENT_DATES: usize = 62;
pub const MAX_PARTICIPANT_NAME_LEN: usize = 64;
pub const MAX_NOTE_LEN: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event name must not be empty")]
    EmptyEventName,
    #[error("event name is longer than {max} characters", max = MAX_EVENT_NAME_LEN)]
    EventNameTooLong,
    #[error("an event needs at least one candidate date")]
    NoDates,
    #[error("an event can have at most {max} candidate dates", max = MAX_EVENT_DATES)]
    TooManyDates,
    #[error("date {0} is listed more than once")]
    DuplicateDate(NaiveDate),
    #[error("hours must be between 0 and 23 with start before end, got {start}..{end}")]
    InvalidHourRange { start: u8, end: u8 },
    #[error("participant name must not be empty")]
    EmptyParticipant,
    #[error("participant name is longer than {max} characters", max = MAX_PARTICIPANT_NAME_LEN)]
    ParticipantTooLong,
    #[error(transparent)]
    SlotKey(#[from] crate::slot::SlotKeyError),
    #[error("slot {0} is not part of this event")]
    SlotOutsideEvent(SlotKey),
    #[error("slot {0} carries a note but is not marked available")]
    NoteWithoutAvailability(SlotKey),
    #[error("note on slot {0} is longer than {max} characters", max = MAX_NOTE_LEN)]
    NoteTooLong(SlotKey),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing)]
    pub row_id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub dates: Vec<NaiveDate>,
    pub start_hour: u8,
    pub end_hour: u8,
    pub created_at: NaiveDateTime,
}

impl Event {
    pub fn contains_slot(&self, slot: &SlotKey) -> bool {
        (self.start_hour..self.end_hour).contains(&slot.hour()) && self.dates.contains(&slot.date())
    }

    /// Every cell of the grid, in chronological order.
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        let mut keys: Vec<SlotKey> = self
            .dates
            .iter()
            .flat_map(|date| (self.start_hour..self.end_hour).map(|hour| SlotKey::new(*date, hour)))
            .collect();
        keys.sort();
        keys
    }
}

/// Raw `events` row; turned into an [`Event`] only after it passes the same
/// checks a new event does.
#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub dates: Json<Vec<NaiveDate>>,
    pub start_hour: i64,
    pub end_hour: i64,
    pub created_at: NaiveDateTime,
}

impl TryFrom<EventRow> for Event {
    type Error = ValidationError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let start = u8::try_from(row.start_hour).unwrap_or(u8::MAX);
        let end = u8::try_from(row.end_hour).unwrap_or(u8::MAX);
        validate_hours(start, end)?;
        validate_dates(&row.dates.0)?;
        Ok(Event {
            row_id: row.id,
            public_id: row.public_id,
            name: row.name,
            description: row.description,
            dates: row.dates.0,
            start_hour: start,
            end_hour: end,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dates: Vec<NaiveDate>,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl NewEvent {
    /// Trims text fields and checks the grid. Blank descriptions become `None`.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        if self.name.chars().count() > MAX_EVENT_NAME_LEN {
            return Err(ValidationError::EventNameTooLong);
        }
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        validate_dates(&self.dates)?;
        validate_hours(self.start_hour, self.end_hour)?;
        Ok(self)
    }
}

fn validate_dates(dates: &[NaiveDate]) -> Result<(), ValidationError> {
    if dates.is_empty() {
        return Err(ValidationError::NoDates);
    }
    if dates.len() > MAX_EVENT_DATES {
        return Err(ValidationError::TooManyDates);
    }
    let mut seen = HashSet::new();
    for date in dates {
        if !seen.insert(date) {
            return Err(ValidationError::DuplicateDate(*date));
        }
    }
    Ok(())
}

fn validate_hours(start: u8, end: u8) -> Result<(), ValidationError> {
    if start > 23 || end > 23 || start >= end {
        return Err(ValidationError::InvalidHourRange { start, end });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMark {
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub note: String,
}

fn default_available() -> bool {
    true
}

/// Body of an availability submission. Keys stay as raw strings here so a
/// bad one is reported by name instead of failing the whole JSON extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilitySubmission {
    pub participant: String,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotMark>,
}

/// A submission that has been checked against its event: the participant's
/// complete set of available slots with their notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub participant: String,
    pub slots: BTreeMap<SlotKey, String>,
}

impl AvailabilitySubmission {
    pub fn validate(self, event: &Event) -> Result<ValidatedSubmission, ValidationError> {
        let participant = normalize_participant(&self.participant)?;

        let mut slots = BTreeMap::new();
        for (raw, mark) in self.slots {
            let key = SlotKey::parse(&raw)?;
            if !event.contains_slot(&key) {
                return Err(ValidationError::SlotOutsideEvent(key));
            }
            let note = mark.note.trim();
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(ValidationError::NoteTooLong(key));
            }
            if !mark.available {
                if !note.is_empty() {
                    return Err(ValidationError::NoteWithoutAvailability(key));
                }
                continue;
            }
            slots.insert(key, note.to_string());
        }

        Ok(ValidatedSubmission { participant, slots })
    }
}

pub fn normalize_participant(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyParticipant);
    }
    if name.chars().count() > MAX_PARTICIPANT_NAME_LEN {
        return Err(ValidationError::ParticipantTooLong);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_event() -> Event {
        Event {
            row_id: 1,
            public_id: "abc123def4".into(),
            name: "board games".into(),
            description: None,
            dates: vec![date("2024-06-01"), date("2024-06-02")],
            start_hour: 18,
            end_hour: 20,
            created_at: date("2024-05-01").and_hms_opt(12, 0, 0).unwrap(),
        }
    }

    fn submission(json: serde_json::Value) -> AvailabilitySubmission {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn grid_is_dates_times_hour_range() {
        let keys: Vec<String> = sample_event()
            .slot_keys()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            keys,
            ["2024-06-01-18", "2024-06-01-19", "2024-06-02-18", "2024-06-02-19"]
        );
    }

    #[test]
    fn end_hour_is_exclusive() {
        let event = sample_event();
        assert!(event.contains_slot(&SlotKey::new(date("2024-06-01"), 19)));
        assert!(!event.contains_slot(&SlotKey::new(date("2024-06-01"), 20)));
        assert!(!event.contains_slot(&SlotKey::new(date("2024-06-03"), 18)));
    }

    #[test]
    fn new_event_is_trimmed_and_checked() {
        let event = NewEvent {
            name: "  grill  ".into(),
            description: Some("   ".into()),
            dates: vec![date("2024-06-01")],
            start_hour: 9,
            end_hour: 17,
        }
        .validated()
        .unwrap();
        assert_eq!(event.name, "grill");
        assert_eq!(event.description, None);
    }

    #[test]
    fn new_event_rejects_bad_grids() {
        let base = NewEvent {
            name: "x".into(),
            description: None,
            dates: vec![date("2024-06-01")],
            start_hour: 9,
            end_hour: 17,
        };

        let mut e = base.clone();
        e.dates.clear();
        assert_eq!(e.validated().unwrap_err(), ValidationError::NoDates);

        let mut e = base.clone();
        e.dates.push(date("2024-06-01"));
        assert_eq!(
            e.validated().unwrap_err(),
            ValidationError::DuplicateDate(date("2024-06-01"))
        );

        let mut e = base.clone();
        e.start_hour = 17;
        assert!(matches!(
            e.validated(),
            Err(ValidationError::InvalidHourRange { .. })
        ));

        let mut e = base.clone();
        e.end_hour = 24;
        assert!(matches!(
            e.validated(),
            Err(ValidationError::InvalidHourRange { .. })
        ));

        let mut e = base.clone();
        e.dates = (1..=MAX_EVENT_DATES as u64 + 1)
            .map(|n| date("2024-01-01") + chrono::Days::new(n))
            .collect();
        assert_eq!(e.validated().unwrap_err(), ValidationError::TooManyDates);

        let mut e = base.clone();
        e.name = "n".repeat(MAX_EVENT_NAME_LEN + 1);
        assert_eq!(e.validated().unwrap_err(), ValidationError::EventNameTooLong);

        let mut e = base;
        e.name = " ".into();
        assert_eq!(e.validated().unwrap_err(), ValidationError::EmptyEventName);
    }

    #[test]
    fn submission_keeps_marked_slots_with_notes() {
        let valid = submission(serde_json::json!({
            "participant": " Aria ",
            "slots": {
                "2024-06-01-18": { "available": true, "note": "remote" },
                "2024-06-01-19": { "available": true },
                "2024-06-02-18": { "available": false }
            }
        }))
        .validate(&sample_event())
        .unwrap();

        assert_eq!(valid.participant, "Aria");
        assert_eq!(valid.slots.len(), 2);
        assert_eq!(valid.slots[&SlotKey::parse("2024-06-01-18").unwrap()], "remote");
        assert_eq!(valid.slots[&SlotKey::parse("2024-06-01-19").unwrap()], "");
    }

    #[test]
    fn available_defaults_to_true() {
        let valid = submission(serde_json::json!({
            "participant": "Bram",
            "slots": { "2024-06-02-19": {} }
        }))
        .validate(&sample_event())
        .unwrap();
        assert_eq!(valid.slots.len(), 1);
    }

    #[test]
    fn submission_rejects_malformed_and_stray_keys() {
        let event = sample_event();

        let err = submission(serde_json::json!({
            "participant": "Aria",
            "slots": { "June first": { "available": true } }
        }))
        .validate(&event)
        .unwrap_err();
        assert!(matches!(err, ValidationError::SlotKey(_)));

        let err = submission(serde_json::json!({
            "participant": "Aria",
            "slots": { "2024-06-01-20": { "available": true } }
        }))
        .validate(&event)
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SlotOutsideEvent(SlotKey::parse("2024-06-01-20").unwrap())
        );
    }

    #[test]
    fn overlong_note_is_rejected() {
        let err = submission(serde_json::json!({
            "participant": "Aria",
            "slots": { "2024-06-01-18": { "note": "x".repeat(MAX_NOTE_LEN + 1) } }
        }))
        .validate(&sample_event())
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoteTooLong(SlotKey::parse("2024-06-01-18").unwrap())
        );
        assert_eq!(
            err.to_string(),
            format!("note on slot 2024-06-01-18 is longer than {MAX_NOTE_LEN} characters")
        );
    }

    #[test]
    fn note_requires_availability() {
        let err = submission(serde_json::json!({
            "participant": "Aria",
            "slots": { "2024-06-01-18": { "available": false, "note": "maybe" } }
        }))
        .validate(&sample_event())
        .unwrap_err();
        assert!(matches!(err, ValidationError::NoteWithoutAvailability(_)));
    }

    #[test]
    fn participant_name_is_required() {
        assert_eq!(normalize_participant("   "), Err(ValidationError::EmptyParticipant));
        assert_eq!(
            normalize_participant(&"x".repeat(MAX_PARTICIPANT_NAME_LEN + 1)),
            Err(ValidationError::ParticipantTooLong)
        );
    }

    #[test]
    fn event_serializes_public_id_as_id() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["id"], "abc123def4");
        assert_eq!(json["startHour"], 18);
        assert!(json.get("rowId").is_none());
    }
}
