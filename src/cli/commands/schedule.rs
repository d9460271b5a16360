//! Schedule command - derived festival timetable

use super::load_state;
use crate::app::SessionState;
use crate::cli::args::{OutputFormat, ScheduleArgs};
use crate::config::Config;
use crate::error::{FestError, FestResult};
use crate::ui::{self, UiContext};
use crate::views::{day_schedule, ScheduleRow};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct DayJson {
    day: u32,
    events: Vec<ScheduleRow>,
}

/// Execute the schedule command
pub async fn execute(args: ScheduleArgs, config: &Config) -> FestResult<()> {
    let days = config.festival.days;
    let selected: Vec<u32> = match args.day {
        Some(day) if day == 0 || day > days => {
            return Err(FestError::User(format!(
                "Day {} is outside the festival (1-{})",
                day, days
            )))
        }
        Some(day) => vec![day],
        None => (1..=days).collect(),
    };

    let state = load_state(config).await?;

    match args.format {
        OutputFormat::Table => print_table(&state, &selected),
        OutputFormat::Json => print_json(&state, &selected)?,
        OutputFormat::Plain => print_plain(&state, &selected),
    }

    Ok(())
}

fn print_table(state: &SessionState, days: &[u32]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Schedule");

    for &day in days {
        ui::section(&ctx, &format!("Day {}", day));
        let rows = day_schedule(state, day);

        if rows.is_empty() {
            ui::remark(&ctx, "No events.");
            continue;
        }

        for row in rows {
            let badge = if row.result_published {
                style(" Result Published").green().to_string()
            } else {
                String::new()
            };
            println!(
                "  {:<9} {:<8} {}{}",
                row.start_time,
                row.venue,
                style(&row.program).bold(),
                badge
            );
            if !row.participants.is_empty() {
                println!(
                    "  {:<18} {} ({})",
                    "",
                    style(row.participants.join(", ")).dim(),
                    row.participants.len()
                );
            }
        }
    }
}

fn print_json(state: &SessionState, days: &[u32]) -> FestResult<()> {
    let out: Vec<DayJson> = days
        .iter()
        .map(|&day| DayJson {
            day,
            events: day_schedule(state, day),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_plain(state: &SessionState, days: &[u32]) {
    for &day in days {
        for row in day_schedule(state, day) {
            println!("{}\t{}\t{}\t{}", day, row.start_time, row.venue, row.program);
        }
    }
}
