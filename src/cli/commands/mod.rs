//! CLI command implementations

pub mod admin;
pub mod cache;
pub mod config;
pub mod home;
pub mod leaderboard;
pub mod results;
pub mod schedule;

pub use admin::execute as admin;
pub use cache::execute as cache;
pub use config::execute as config;
pub use home::execute as home;
pub use leaderboard::execute as leaderboard;
pub use results::execute as results;
pub use schedule::execute as schedule;

use crate::app::{App, SessionState};
use crate::config::Config;
use crate::error::FestResult;

/// Connect and load everything the public views need
async fn load_state(config: &Config) -> FestResult<SessionState> {
    let app = App::connect(config.clone()).await?;
    Ok(app.load().await)
}
