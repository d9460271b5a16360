//! Spinner for long-running work such as a cache install

use super::context::UiContext;
use super::output::Level;
use console::style;

/// cliclack spinner on a terminal, tagged lines elsewhere
pub struct TaskSpinner {
    fancy: bool,
    active: Option<cliclack::ProgressBar>,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            fancy: ctx.use_fancy_output(),
            active: None,
        }
    }

    pub fn start(&mut self, message: &str) {
        if !self.fancy {
            println!("{} {}", style("...").dim(), message);
            return;
        }
        let spinner = cliclack::spinner();
        spinner.start(message);
        self.active = Some(spinner);
    }

    fn finish(&mut self, level: Level, message: &str) {
        match self.active.take() {
            Some(spinner) if level == Level::Fail => spinner.error(message),
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", level.tag(), message),
        }
    }

    pub fn stop(&mut self, message: &str) {
        self.finish(Level::Ok, message);
    }

    pub fn stop_error(&mut self, message: &str) {
        self.finish(Level::Fail, message);
    }

    /// Finished, but not the way the caller asked for
    pub fn stop_warn(&mut self, message: &str) {
        self.finish(Level::Warn, message);
    }
}
