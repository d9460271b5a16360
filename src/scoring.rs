//! Faculty score aggregation
//!
//! The score table is rebuilt from the full results log on every load.
//! Accumulation is a per-faculty sum, so the order of results never
//! matters.

use crate::config::ScoringConfig;
use crate::results::{EventType, Position, ResultEntry};
use crate::roster::Roster;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Faculty (upper-cased) to accumulated points
pub type FacultyScoreTable = BTreeMap<String, u32>;

/// Points awarded for a podium position in an event type
pub fn points_for(event_type: EventType, position: Position) -> u32 {
    match (event_type, position) {
        (EventType::Individual, Position::First) => 5,
        (EventType::Individual, Position::Second) => 3,
        (EventType::Individual, Position::Third) => 1,
        (EventType::Group, Position::First) => 10,
        (EventType::Group, Position::Second) => 5,
        (EventType::Group, Position::Third) => 3,
    }
}

/// Canonical faculty key
pub fn faculty_key(faculty: &str) -> String {
    faculty.trim().to_uppercase()
}

/// Stored points, or the position table for legacy records
pub fn resolve_points(entry: &ResultEntry) -> u32 {
    entry.points.unwrap_or_else(|| {
        points_for(entry.event_type.unwrap_or_default(), entry.position)
    })
}

/// Build the score table.
///
/// Every configured faculty, every faculty in the results and (under the
/// participation policy) every roster faculty gets a key, starting at zero.
pub fn aggregate(
    results: &[ResultEntry],
    roster: Option<&Roster>,
    policy: &ScoringConfig,
) -> FacultyScoreTable {
    let mut table: FacultyScoreTable = policy
        .faculties
        .iter()
        .map(|f| (faculty_key(f), 0))
        .collect();

    if policy.participation_points {
        if let Some(roster) = roster {
            for participant in roster.all_participants() {
                let score = table.entry(faculty_key(&participant.faculty)).or_insert(0);
                *score = score.saturating_add(1);
            }
        }
    }

    for entry in results {
        let points = resolve_points(entry);
        let score = table.entry(faculty_key(&entry.winner.faculty)).or_insert(0);
        *score = score.saturating_add(points);
        debug!(
            "Added {} points to {} for {}",
            points,
            faculty_key(&entry.winner.faculty),
            entry.program
        );
    }

    table
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based rank
    pub rank: usize,
    pub faculty: String,
    pub score: u32,
}

/// Rank faculties, highest score first, ties alphabetical
pub fn leaderboard(table: &FacultyScoreTable) -> Vec<Standing> {
    let mut rows: Vec<(&String, &u32)> = table.iter().collect();
    // BTreeMap iteration is already alphabetical; a stable sort keeps that for ties
    rows.sort_by(|a, b| b.1.cmp(a.1));

    rows.into_iter()
        .enumerate()
        .map(|(i, (faculty, score))| Standing {
            rank: i + 1,
            faculty: faculty.clone(),
            score: *score,
        })
        .collect()
}
