//! Heat map aggregation over one event's availability snapshot.
//!
//! Everything here is pure: the store hands over a snapshot and gets back a
//! plain serializable structure. Participant order is always the order in
//! which the snapshot lists them, which the store keeps as first-submission
//! order.

use crate::models::{Event, SlotMark};
use crate::slot::SlotKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// One participant's marks: every slot they are available for, with its note
/// (empty when none was given).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParticipantAvailability {
    pub name: String,
    pub slots: BTreeMap<SlotKey, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotNote {
    pub participant: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SlotSummary {
    pub count: usize,
    pub participants: Vec<String>,
    pub notes: Vec<SlotNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub participants: Vec<String>,
    pub slots: BTreeMap<SlotKey, SlotSummary>,
    pub max_count: usize,
    /// Marks that fall outside the event grid. Left out of every count.
    #[serde(skip)]
    pub ignored: Vec<(String, SlotKey)>,
}

/// Aggregates a snapshot by slot. Every grid cell is present, with a zero
/// count when nobody marked it.
pub fn heatmap(event: &Event, snapshot: &[ParticipantAvailability]) -> Heatmap {
    let mut slots: BTreeMap<SlotKey, SlotSummary> = event
        .slot_keys()
        .into_iter()
        .map(|key| (key, SlotSummary::default()))
        .collect();
    let mut ignored = Vec::new();

    for participant in snapshot {
        for (key, note) in &participant.slots {
            let Some(summary) = slots.get_mut(key) else {
                ignored.push((participant.name.clone(), *key));
                continue;
            };
            summary.count += 1;
            summary.participants.push(participant.name.clone());
            if !note.is_empty() {
                summary.notes.push(SlotNote {
                    participant: participant.name.clone(),
                    note: note.clone(),
                });
            }
        }
    }

    let max_count = slots.values().map(|s| s.count).max().unwrap_or(0);
    Heatmap {
        participants: snapshot.iter().map(|p| p.name.clone()).collect(),
        slots,
        max_count,
        ignored,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityView {
    pub participants: Vec<String>,
    pub availability: BTreeMap<String, BTreeMap<SlotKey, SlotMark>>,
}

/// The per-participant shape: who marked what, with `available: true` on
/// every entry since unmarked slots have no entry at all.
pub fn participant_view(snapshot: &[ParticipantAvailability]) -> AvailabilityView {
    let availability = snapshot
        .iter()
        .map(|p| (p.name.clone(), marks_of(p)))
        .collect();
    AvailabilityView {
        participants: snapshot.iter().map(|p| p.name.clone()).collect(),
        availability,
    }
}

pub fn marks_of(participant: &ParticipantAvailability) -> BTreeMap<SlotKey, SlotMark> {
    participant
        .slots
        .iter()
        .map(|(key, note)| {
            (
                *key,
                SlotMark {
                    available: true,
                    note: note.clone(),
                },
            )
        })
        .collect()
}
