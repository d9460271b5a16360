//! Status lines, headers and key/value rows
//!
//! Interactive terminals get cliclack's gutter; everything else gets
//! bracketed tags so piped output stays greppable.

use super::context::UiContext;
use console::{style, StyledObject};

/// Outcome shown in front of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Level {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Level {
    pub(super) fn tag(self) -> StyledObject<&'static str> {
        match self {
            Self::Ok => style("[OK]").green(),
            Self::Info => style("[INFO]").magenta(),
            Self::Warn => style("[WARN]").yellow(),
            Self::Fail => style("[FAIL]").red(),
        }
    }
}

fn emit(ctx: &UiContext, level: Level, text: String) {
    if !ctx.use_fancy_output() {
        println!("  {} {}", level.tag(), text);
        return;
    }

    // Terminal write errors are not worth failing a command over
    let _ = match level {
        Level::Ok => cliclack::log::success(text),
        Level::Info => cliclack::log::info(text),
        Level::Warn => cliclack::log::warning(text),
        Level::Fail => cliclack::log::error(text),
    };
}

/// Title banner for a view
pub fn intro(ctx: &UiContext, title: &str) {
    let title = style(title).magenta().bold();
    if ctx.use_fancy_output() {
        let _ = cliclack::intro(title);
    } else {
        println!("{}\n", title);
    }
}

/// Sub-heading, e.g. one festival day
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        let _ = cliclack::log::info(style(title).bold());
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Ok, message.to_string());
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    let detail = if ctx.use_fancy_output() {
        style(detail).dim().to_string()
    } else {
        detail.to_string()
    };
    emit(ctx, Level::Ok, format!("{} ({})", message, detail));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    emit(ctx, Level::Warn, format!("{} - {}", message, style(hint).dim()));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Info, message.to_string());
}

/// Low-key note, dimmed
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::log::remark(message);
    } else {
        println!("  {}", style(message).dim());
    }
}

/// Indented `key: value` row
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = if ctx.use_fancy_output() {
        style(key).dim().to_string()
    } else {
        key.to_string()
    };
    println!("  {}: {}", key, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_have_distinct_tags() {
        let tags: Vec<String> = [Level::Ok, Level::Info, Level::Warn, Level::Fail]
            .into_iter()
            .map(|l| console::strip_ansi_codes(&l.tag().to_string()).into_owned())
            .collect();
        assert_eq!(tags, vec!["[OK]", "[INFO]", "[WARN]", "[FAIL]"]);
    }

    #[test]
    fn plain_output_does_not_panic() {
        let ctx = UiContext::non_interactive();
        intro(&ctx, "Leaderboard");
        section(&ctx, "Day 1");
        step_ok_detail(&ctx, "Result published", "1st SCIENCE - 5 pts");
        step_warn_hint(&ctx, "Nothing deleted", "Use --yes");
        remark(&ctx, "No events.");
        key_value(&ctx, "Mode", "tiered");
    }
}
