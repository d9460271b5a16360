//! Leaderboard command - faculty standings

use super::load_state;
use crate::cli::args::{OutputFormat, ViewArgs};
use crate::config::Config;
use crate::error::FestResult;
use crate::ui::{self, UiContext};
use crate::views::{leaderboard_rows, LeaderboardRow};
use console::style;

const BAR_WIDTH: usize = 20;

/// Execute the leaderboard command
pub async fn execute(args: ViewArgs, config: &Config) -> FestResult<()> {
    let state = load_state(config).await?;
    let rows = leaderboard_rows(&state);

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No points data available yet");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => print_plain(&rows),
    }

    Ok(())
}

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "━".repeat(filled), "─".repeat(BAR_WIDTH - filled))
}

fn print_table(rows: &[LeaderboardRow]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Leaderboard");

    println!(
        "{:<6} {:<32} {:>6}",
        style("RANK").bold(),
        style("FACULTY").bold(),
        style("POINTS").bold()
    );
    println!("{}", "-".repeat(68));

    for row in rows {
        let rank = match row.rank {
            1 => style(format!("#{}", row.rank)).red().bold(),
            2 => style(format!("#{}", row.rank)).blue().bold(),
            3 => style(format!("#{}", row.rank)).yellow().bold(),
            _ => style(row.rank.to_string()),
        };

        println!(
            "{:<6} {:<32} {:>6}  {}",
            rank,
            row.faculty,
            row.score,
            style(bar(row.percent)).cyan()
        );
    }
}

fn print_plain(rows: &[LeaderboardRow]) {
    for row in rows {
        println!("{}\t{}\t{}", row.rank, row.faculty, row.score);
    }
}
