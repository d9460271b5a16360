//! Custom theme for cliclack prompts
//!
//! Steps are marked with notes while running and a star once published.
//! Terminals without unicode get the ASCII fallbacks.

use cliclack::ThemeState;
use console::{Emoji, Style};

const STEP_ACTIVE: Emoji<'static, 'static> = Emoji("♪", ">");
const STEP_SUBMIT: Emoji<'static, 'static> = Emoji("★", "*");
const STEP_CANCEL: Emoji<'static, 'static> = Emoji("■", "x");
const STEP_ERROR: Emoji<'static, 'static> = Emoji("▲", "!");
/// indicatif tick chars; the last one is shown when the spinner stops
const SPINNER: Emoji<'static, 'static> = Emoji("♩♪♫♬★", "-\\|/*");

/// Festboard theme, magenta accents
#[derive(Debug, Clone, Default)]
pub struct FestTheme;

impl cliclack::Theme for FestTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().magenta().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Submit => Style::new().yellow().bold(),
            _ => self.bar_color(state),
        }
    }

    fn state_symbol(&self, state: &ThemeState) -> String {
        let symbol = match state {
            ThemeState::Active => STEP_ACTIVE,
            ThemeState::Submit => STEP_SUBMIT,
            ThemeState::Cancel => STEP_CANCEL,
            ThemeState::Error(_) => STEP_ERROR,
        };
        self.state_symbol_color(state).apply_to(symbol).to_string()
    }

    fn submit_symbol(&self) -> String {
        Style::new().yellow().bold().apply_to(STEP_SUBMIT).to_string()
    }

    fn spinner_chars(&self) -> String {
        SPINNER.to_string()
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(FestTheme);
}
