//! Home command - top faculty and what's on next

use super::load_state;
use crate::cli::args::{OutputFormat, ViewArgs};
use crate::config::Config;
use crate::error::FestResult;
use crate::schedule::festival_now;
use crate::ui::{self, UiContext};
use crate::views::{home_summary, HomeSummary};
use console::style;

/// Execute the home command
pub async fn execute(args: ViewArgs, config: &Config) -> FestResult<()> {
    let now = festival_now(&config.festival)?;
    let state = load_state(config).await?;
    let summary = home_summary(&state, now);

    match args.format {
        OutputFormat::Table => print_table(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => print_plain(&summary),
    }

    Ok(())
}

fn print_table(summary: &HomeSummary) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Arts Fest");

    match &summary.top_faculty {
        Some(top) => ui::key_value(
            &ctx,
            "Leading faculty",
            &format!("{} ({} pts)", style(&top.faculty).bold(), top.score),
        ),
        None => ui::key_value(&ctx, "Leading faculty", "-"),
    }

    match &summary.next_event {
        Some(event) => ui::key_value(
            &ctx,
            "Up next",
            &format!(
                "{} at {} on day {}, {}",
                style(&event.program).bold(),
                event.start_time,
                event.day,
                event.venue
            ),
        ),
        None => ui::key_value(&ctx, "Up next", "No more events"),
    }

    ui::key_value(
        &ctx,
        "Results",
        &format!("{} of {} events", summary.results_published, summary.events),
    );
}

fn print_plain(summary: &HomeSummary) {
    if let Some(top) = &summary.top_faculty {
        println!("{}\t{}", top.faculty, top.score);
    }
    if let Some(event) = &summary.next_event {
        println!("{}\t{}", event.program, event.start_time);
    }
}
