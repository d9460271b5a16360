//! Deterministic schedule derivation
//!
//! Every event gets a day, an hour and a stage from a hash of its name, so
//! the same roster always produces the same timetable without storing it.
//! Events whose hashes collide share a slot; that is accepted.

use crate::config::FestivalConfig;
use crate::error::{FestError, FestResult};
use crate::roster::Roster;
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// First hour of the festival day
const FIRST_HOUR: u32 = 9;
/// Number of hourly slots per day (9:00 through 16:00)
const HOURLY_SLOTS: u32 = 8;
/// Number of stages
const STAGES: u32 = 4;

/// A derived timetable slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub program: String,
    /// 1-based festival day
    pub day: u32,
    /// 12-hour display time, e.g. "1:00 PM"
    pub start_time: String,
    pub venue: String,
    pub sort_key: NaiveDateTime,
}

/// Sum of the name's character codes
pub fn name_hash(name: &str) -> u32 {
    name.chars().fold(0u32, |acc, c| acc.wrapping_add(c as u32))
}

/// Format an hour of day as "9:00 AM" / "12:00 PM"
pub fn display_hour(hour: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let shown = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:00 {}", shown, suffix)
}

/// Derive one slot for an event name
pub fn slot_for(program: &str, festival: &FestivalConfig) -> ScheduleEntry {
    let hash = name_hash(program);
    let days = festival.days.max(1);
    let day_index = hash % days;
    let hour = FIRST_HOUR + hash % HOURLY_SLOTS;

    let date = festival
        .start_date
        .checked_add_days(Days::new(u64::from(day_index)))
        .unwrap_or(festival.start_date);
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();

    ScheduleEntry {
        program: program.to_string(),
        day: day_index + 1,
        start_time: display_hour(hour),
        venue: format!("Stage {}", hash % STAGES + 1),
        sort_key: date.and_time(time),
    }
}

/// Derive the full timetable, sorted by start; ties keep roster order
pub fn derive_schedule(roster: &Roster, festival: &FestivalConfig) -> Vec<ScheduleEntry> {
    let mut schedule: Vec<ScheduleEntry> = roster
        .events()
        .map(|program| slot_for(program, festival))
        .collect();

    // sort_by_key is stable
    schedule.sort_by_key(|entry| entry.sort_key);
    schedule
}

/// Entries on one festival day, in timetable order
pub fn events_on_day(schedule: &[ScheduleEntry], day: u32) -> Vec<&ScheduleEntry> {
    schedule.iter().filter(|entry| entry.day == day).collect()
}

/// The festival clock: the configured `now`, else local wall time
pub fn festival_now(festival: &FestivalConfig) -> FestResult<NaiveDateTime> {
    match festival.now.as_deref() {
        Some(raw) => parse_local_time(raw),
        None => Ok(Local::now().naive_local()),
    }
}

/// Parse "2026-02-20T09:00" or "2026-02-20T09:00:00"
pub fn parse_local_time(raw: &str) -> FestResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|e| FestError::ConfigValue {
            key: "festival.now".to_string(),
            reason: format!("'{}': {}", raw, e),
        })
}

/// First event starting strictly after `now`
pub fn next_event(schedule: &[ScheduleEntry], now: NaiveDateTime) -> Option<&ScheduleEntry> {
    schedule.iter().find(|entry| entry.sort_key > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Participant;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn festival(days: u32) -> FestivalConfig {
        FestivalConfig {
            start_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            days,
            now: None,
        }
    }

    fn roster_of(names: &[&str]) -> Roster {
        names
            .iter()
            .map(|n| (n.to_string(), vec![Participant::new("A", "SCIENCE")]))
            .collect()
    }

    #[test]
    fn solo_song_slot() {
        // 852: day 852 % 4 + 1 = 1, hour 9 + 852 % 8 = 13, stage 852 % 4 + 1 = 1
        let entry = slot_for("Solo Song", &festival(4));
        assert_eq!(name_hash("Solo Song"), 852);
        assert_eq!(entry.day, 1);
        assert_eq!(entry.start_time, "1:00 PM");
        assert_eq!(entry.venue, "Stage 1");
        assert_eq!(
            entry.sort_key,
            NaiveDate::from_ymd_opt(2026, 2, 20)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn display_hours() {
        assert_eq!(display_hour(9), "9:00 AM");
        assert_eq!(display_hour(12), "12:00 PM");
        assert_eq!(display_hour(16), "4:00 PM");
    }

    #[test]
    fn empty_roster_empty_schedule() {
        assert!(derive_schedule(&Roster::new(), &festival(4)).is_empty());
    }

    #[test]
    fn collisions_keep_roster_order() {
        // Anagrams hash identically and must stay in roster order
        let schedule = derive_schedule(&roster_of(&["ab", "ba"]), &festival(4));
        assert_eq!(schedule[0].sort_key, schedule[1].sort_key);
        assert_eq!(schedule[0].program, "ab");
        assert_eq!(schedule[1].program, "ba");
    }

    #[test]
    fn sorted_by_start() {
        let schedule = derive_schedule(
            &roster_of(&["Solo Song", "Mime", "Group Dance", "Kolkali", "Essay"]),
            &festival(4),
        );
        assert!(schedule.windows(2).all(|w| w[0].sort_key <= w[1].sort_key));
    }

    #[test]
    fn day_filter_and_next_event() {
        let schedule = derive_schedule(&roster_of(&["Solo Song", "Mime", "Essay"]), &festival(3));
        for entry in events_on_day(&schedule, 1) {
            assert_eq!(entry.day, 1);
        }

        let before_all = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(next_event(&schedule, before_all), schedule.first());

        let last = schedule.last().unwrap().sort_key;
        assert!(next_event(&schedule, last).is_none());
    }

    #[test]
    fn festival_clock() {
        let mut cfg = festival(4);
        cfg.now = Some("2026-02-20T09:00".to_string());
        assert_eq!(
            festival_now(&cfg).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 20)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );

        assert!(parse_local_time("2026-02-20T09:00:30").is_ok());
        assert!(parse_local_time("tomorrow").is_err());
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(names in prop::collection::vec("[A-Za-z ]{1,16}", 0..12), days in 1u32..7) {
            let roster: Roster = names
                .iter()
                .map(|n| (n.clone(), Vec::new()))
                .collect();
            let cfg = festival(days);

            let first = derive_schedule(&roster, &cfg);
            let second = derive_schedule(&roster, &cfg);
            prop_assert_eq!(&first, &second);

            for entry in &first {
                prop_assert!(entry.day >= 1 && entry.day <= days);
            }
        }
    }
}
