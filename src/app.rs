//! Application controller
//!
//! Wires the network, the cache router and the results store together, and
//! loads one immutable `SessionState` per command.

use crate::cache::{CacheRouter, CacheStorage};
use crate::config::{self, Config, ConfigManager};
use crate::error::{FestError, FestResult};
use crate::fetch::{Fetcher, NetworkFetcher, Request};
use crate::results::ResultEntry;
use crate::roster::Roster;
use crate::schedule::{derive_schedule, ScheduleEntry};
use crate::scoring::{aggregate, FacultyScoreTable};
use crate::store::{HttpStore, ResultsStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the views need, loaded once
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub roster: Roster,
    pub results: Vec<ResultEntry>,
    /// Version the results were read at; `None` when the read failed
    pub results_version: Option<String>,
    pub schedule: Vec<ScheduleEntry>,
    pub scores: FacultyScoreTable,
}

/// Build and start the cache router for a config
pub async fn start_router(config: &Config) -> FestResult<Arc<CacheRouter>> {
    let network: Arc<dyn Fetcher> = Arc::new(NetworkFetcher::new(Duration::from_secs(
        config.general.timeout_secs,
    )));
    let storage = CacheStorage::new(ConfigManager::cache_dir_for(config));
    let router = Arc::new(CacheRouter::from_config(config, storage, network)?);
    router.start().await?;
    Ok(router)
}

pub struct App {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    store: Option<Arc<dyn ResultsStore>>,
}

impl App {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        store: Option<Arc<dyn ResultsStore>>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
        }
    }

    /// Start the router and point the results store at it
    pub async fn connect(config: Config) -> FestResult<Self> {
        let router = start_router(&config).await?;
        let fetcher: Arc<dyn Fetcher> = router;

        let store: Option<Arc<dyn ResultsStore>> = if config.store.bin_id.trim().is_empty() {
            debug!("No results document configured");
            None
        } else {
            Some(Arc::new(HttpStore::from_config(&config, fetcher.clone())?))
        };

        Ok(Self::new(config, fetcher, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The results store, required by admin commands
    pub fn store(&self) -> FestResult<Arc<dyn ResultsStore>> {
        self.store
            .clone()
            .ok_or_else(|| FestError::ConfigValue {
                key: "store.bin_id".to_string(),
                reason: "no results document configured".to_string(),
            })
    }

    /// Load roster and results concurrently and derive the rest.
    ///
    /// Failures degrade to empty data with a warning; this never fails.
    pub async fn load(&self) -> SessionState {
        let (roster, (results, results_version)) =
            tokio::join!(self.load_roster(), self.load_results());

        let schedule = derive_schedule(&roster, &self.config.festival);
        let scores = aggregate(&results, Some(&roster), &self.config.scoring);

        SessionState {
            roster,
            results,
            results_version,
            schedule,
            scores,
        }
    }

    async fn load_roster(&self) -> Roster {
        let url = match config::resolve_asset(&self.config, &self.config.roster.source) {
            Ok(url) => url,
            Err(e) => {
                warn!("Roster unavailable: {}", e);
                return Roster::default();
            }
        };

        let response = match self.fetcher.fetch(Request::get(url.clone())).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Roster unavailable: {}", e);
                return Roster::default();
            }
        };

        match response.error_for_status(&url) {
            Ok(response) => Roster::from_json(&response.body),
            Err(e) => {
                warn!("Roster unavailable: {}", e);
                Roster::default()
            }
        }
    }

    async fn load_results(&self) -> (Vec<ResultEntry>, Option<String>) {
        let Some(store) = &self.store else {
            return (Vec::new(), None);
        };

        match store.read_latest().await {
            Ok(snapshot) => (snapshot.records(), Some(snapshot.version)),
            Err(e) => {
                warn!("Results unavailable, showing none: {}", e);
                (Vec::new(), None)
            }
        }
    }
}
