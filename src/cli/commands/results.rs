//! Results command - published results feed

use super::load_state;
use crate::cli::args::{OutputFormat, ViewArgs};
use crate::config::Config;
use crate::error::FestResult;
use crate::ui::{self, UiContext};
use crate::views::{results_feed, ResultCard};
use console::style;

/// Execute the results command
pub async fn execute(args: ViewArgs, config: &Config) -> FestResult<()> {
    let state = load_state(config).await?;
    let cards = results_feed(&state);
    print_cards(&cards, args.format, false)
}

/// Print result cards; `with_index` adds the index `admin delete` takes
pub(crate) fn print_cards(
    cards: &[ResultCard],
    format: OutputFormat,
    with_index: bool,
) -> FestResult<()> {
    if cards.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No results published yet");
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(cards, with_index),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(cards)?),
        OutputFormat::Plain => print_plain(cards),
    }

    Ok(())
}

fn print_table(cards: &[ResultCard], with_index: bool) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Results");

    for card in cards {
        let place = match card.place {
            "1st" => style(card.place).yellow().bold(),
            "2nd" => style(card.place).white().bold(),
            _ => style(card.place).red().bold(),
        };
        let index = if with_index {
            format!("[{}] ", card.index)
        } else {
            String::new()
        };
        let date = card
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        println!(
            "{}{} {}  {} {}",
            style(index).dim(),
            style(&card.program).bold(),
            style(date).dim(),
            place,
            style(format!("({} pts)", card.points)).dim()
        );
        println!("    {} - {}", card.winner, style(&card.faculty).cyan());
    }

    println!();
    println!("{} result(s)", cards.len());
}

fn print_plain(cards: &[ResultCard]) {
    for card in cards {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            card.index, card.program, card.place, card.winner, card.faculty
        );
    }
}
