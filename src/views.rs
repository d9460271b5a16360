//! Read-only projections of a `SessionState`

use crate::app::SessionState;
use crate::results::ResultEntry;
use crate::schedule::{events_on_day, next_event, ScheduleEntry};
use crate::scoring::{leaderboard, resolve_points, Standing};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub faculty: String,
    pub score: u32,
    /// Share of the top score, 0-100; the top score counts as at least 1
    pub percent: f64,
}

pub fn leaderboard_rows(state: &SessionState) -> Vec<LeaderboardRow> {
    let standings = leaderboard(&state.scores);
    let top = standings.first().map(|s| s.score).unwrap_or(0).max(1);

    standings
        .into_iter()
        .map(|s| LeaderboardRow {
            rank: s.rank,
            percent: f64::from(s.score) / f64::from(top) * 100.0,
            faculty: s.faculty,
            score: s.score,
        })
        .collect()
}

/// One card in the results feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    /// Position in publication order, as used by `admin delete`
    pub index: usize,
    pub program: String,
    pub place: &'static str,
    pub winner: String,
    pub faculty: String,
    pub points: u32,
    pub date: Option<NaiveDate>,
}

impl ResultCard {
    fn from_entry(index: usize, entry: &ResultEntry) -> Self {
        Self {
            index,
            program: entry.program.clone(),
            place: entry.position.label(),
            winner: entry.winner.name.clone(),
            faculty: entry.winner.faculty.clone(),
            points: resolve_points(entry),
            date: entry.created_at.map(|t| t.date_naive()),
        }
    }
}

/// Published results, newest first
pub fn results_feed(state: &SessionState) -> Vec<ResultCard> {
    feed_of(&state.results)
}

/// Cards for a results sequence, newest first
pub fn feed_of(results: &[ResultEntry]) -> Vec<ResultCard> {
    results
        .iter()
        .enumerate()
        .rev()
        .map(|(i, entry)| ResultCard::from_entry(i, entry))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub program: String,
    pub start_time: String,
    pub venue: String,
    pub participants: Vec<String>,
    pub result_published: bool,
}

/// Timetable for one festival day
pub fn day_schedule(state: &SessionState, day: u32) -> Vec<ScheduleRow> {
    events_on_day(&state.schedule, day)
        .into_iter()
        .map(|event| ScheduleRow {
            program: event.program.clone(),
            start_time: event.start_time.clone(),
            venue: event.venue.clone(),
            participants: state
                .roster
                .participants(&event.program)
                .iter()
                .map(|p| p.name.clone())
                .collect(),
            result_published: state.results.iter().any(|r| r.program == event.program),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub top_faculty: Option<Standing>,
    pub next_event: Option<ScheduleEntry>,
    pub results_published: usize,
    pub events: usize,
}

pub fn home_summary(state: &SessionState, now: NaiveDateTime) -> HomeSummary {
    HomeSummary {
        top_faculty: leaderboard(&state.scores).into_iter().next(),
        next_event: next_event(&state.schedule, now).cloned(),
        results_published: state.results.len(),
        events: state.schedule.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FestivalConfig, ScoringConfig};
    use crate::results::Position;
    use crate::roster::{Participant, Roster};
    use crate::schedule::derive_schedule;
    use crate::scoring::aggregate;

    fn result(program: &str, faculty: &str, position: Position) -> ResultEntry {
        ResultEntry {
            program: program.to_string(),
            winner: Participant::new("Asha", faculty),
            position,
            points: None,
            event_type: None,
            created_at: None,
        }
    }

    fn state(results: Vec<ResultEntry>) -> SessionState {
        let roster: Roster = [
            (
                "Solo Song".to_string(),
                vec![Participant::new("Asha", "SCIENCE"), Participant::new("Ravi", "ARTS")],
            ),
            ("Mime".to_string(), vec![Participant::new("Meera", "ARTS")]),
        ]
        .into_iter()
        .collect();
        let festival = FestivalConfig::default();
        let schedule = derive_schedule(&roster, &festival);
        let scores = aggregate(&results, Some(&roster), &ScoringConfig::default());

        SessionState {
            roster,
            results,
            results_version: None,
            schedule,
            scores,
        }
    }

    #[test]
    fn leaderboard_percentages() {
        let rows = leaderboard_rows(&state(vec![
            result("Solo Song", "SCIENCE", Position::First),
            result("Mime", "ARTS", Position::Third),
        ]));

        assert_eq!(rows[0].faculty, "SCIENCE");
        assert_eq!(rows[0].percent, 100.0);
        assert_eq!(rows[1].faculty, "ARTS");
        assert_eq!(rows[1].percent, 20.0);
    }

    #[test]
    fn all_zero_leaderboard_has_no_division_by_zero() {
        let rows = leaderboard_rows(&state(vec![]));
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.percent == 0.0));
    }

    #[test]
    fn feed_is_newest_first_with_publication_index() {
        let feed = results_feed(&state(vec![
            result("Solo Song", "SCIENCE", Position::First),
            result("Mime", "ARTS", Position::Second),
        ]));

        assert_eq!(feed[0].program, "Mime");
        assert_eq!(feed[0].index, 1);
        assert_eq!(feed[0].place, "2nd");
        assert_eq!(feed[0].points, 3);
        assert_eq!(feed[1].index, 0);
    }

    #[test]
    fn schedule_marks_published_results() {
        // "Solo Song" lands on day 1
        let rows = day_schedule(&state(vec![result("Solo Song", "SCIENCE", Position::First)]), 1);
        let solo = rows.iter().find(|r| r.program == "Solo Song").unwrap();

        assert!(solo.result_published);
        assert_eq!(solo.participants, vec!["Asha", "Ravi"]);
        assert_eq!(solo.start_time, "1:00 PM");
    }

    #[test]
    fn home_summary_picks_next_event() {
        let s = state(vec![result("Mime", "ARTS", Position::First)]);
        let now = NaiveDate::from_ymd_opt(2026, 2, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let home = home_summary(&s, now);
        assert_eq!(home.top_faculty.unwrap().faculty, "ARTS");
        assert!(home.next_event.unwrap().sort_key > now);
        assert_eq!(home.results_published, 1);
        assert_eq!(home.events, 2);
    }
}
