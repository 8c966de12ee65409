//! kiedy: group availability polling.
//!
//! Participants mark the (date, hour) cells of an event they can attend,
//! optionally with a note, and everyone reads back a heat map of overlap.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod slot;
pub mod state;

pub use router::create_router;
pub use state::AppState;
