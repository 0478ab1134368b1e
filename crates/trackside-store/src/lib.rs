//! SQLite persistence for the race domain.
//!
//! Holds teams, races, and the junction between them. Races move through a
//! small lifecycle (`planned → running ⇄ paused → finished`) with the
//! transition rules enforced here so every caller gets the same answer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::TrackStore;
pub use types::{Race, RaceStatus, Team, TeamSummary};
