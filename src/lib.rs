//! Festboard - festival schedule, results and leaderboard
//!
//! Derives a deterministic timetable from the participant roster, totals
//! faculty points from results kept in a remote JSON document, and routes
//! every fetch through an offline-capable cache.

pub mod admin;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod results;
pub mod roster;
pub mod schedule;
pub mod scoring;
pub mod store;
pub mod ui;
pub mod views;

pub use error::{FestError, FestResult};
