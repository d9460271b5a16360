//! The intercepting fetch router
//!
//! Sits between the application and the network, owns the cache, and
//! answers every request exactly once. Lifecycle:
//!
//! ```text
//! Idle -> Installing -> Installed -> Activating -> Active
//!              \
//!               -> Redundant (install failed)
//! ```

use crate::cache::policy::{RequestClass, RouteTable};
use crate::cache::storage::{validate_generation, CacheStorage, GenerationInfo, GenerationState};
use crate::config::{self, CacheMode, Config};
use crate::error::{FestError, FestResult};
use crate::fetch::{Fetcher, Method, Request, Response};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Router lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Installing,
    Installed,
    Activating,
    Active,
    /// Install failed; this generation will never activate
    Redundant,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Router settings, normally taken from `[cache]`
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub generation: String,
    pub mode: CacheMode,
    pub skip_waiting: bool,
    pub fallback_to_network_only: bool,
    /// Resolved manifest: local assets then pinned URLs
    pub manifest: Vec<Url>,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> FestResult<Self> {
        validate_generation(&config.cache.generation)?;

        let mut manifest = Vec::new();
        for local in &config.cache.manifest.local {
            manifest.push(config::resolve_asset(config, local)?);
        }
        for pinned in &config.cache.manifest.pinned {
            manifest.push(config::parse_url(pinned)?);
        }

        Ok(Self {
            generation: config.cache.generation.clone(),
            mode: config.cache.mode,
            skip_waiting: config.cache.skip_waiting,
            fallback_to_network_only: config.cache.fallback_to_network_only,
            manifest,
        })
    }
}

/// Decrements the in-flight count when a handler finishes
struct InFlight<'a> {
    count: &'a AtomicUsize,
    idle: &'a Notify,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize, idle: &'a Notify) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self { count, idle }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Service-worker style cache router
pub struct CacheRouter {
    storage: CacheStorage,
    network: Arc<dyn Fetcher>,
    routes: RouteTable,
    settings: RouterSettings,
    /// Effective mode; drops to network-only if install fails and fallback is on
    mode: RwLock<CacheMode>,
    state: RwLock<Lifecycle>,
    in_flight: AtomicUsize,
    idle: Notify,
    /// Client session -> generation controlling it
    clients: RwLock<HashMap<Uuid, Option<String>>>,
}

impl CacheRouter {
    pub fn new(
        storage: CacheStorage,
        network: Arc<dyn Fetcher>,
        routes: RouteTable,
        settings: RouterSettings,
    ) -> Self {
        Self {
            storage,
            network,
            routes,
            mode: RwLock::new(settings.mode),
            settings,
            state: RwLock::new(Lifecycle::Idle),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Build a router from configuration
    pub fn from_config(
        config: &Config,
        storage: CacheStorage,
        network: Arc<dyn Fetcher>,
    ) -> FestResult<Self> {
        Ok(Self::new(
            storage,
            network,
            RouteTable::from_config(config)?,
            RouterSettings::from_config(config)?,
        ))
    }

    pub async fn state(&self) -> Lifecycle {
        *self.state.read().await
    }

    pub async fn mode(&self) -> CacheMode {
        *self.mode.read().await
    }

    pub fn generation(&self) -> &str {
        &self.settings.generation
    }

    pub fn classify(&self, url: &Url) -> RequestClass {
        self.routes.classify(url)
    }

    async fn set_state(&self, state: Lifecycle) {
        let mut current = self.state.write().await;
        debug!("Router {} -> {}", *current, state);
        *current = state;
    }

    /// Register a client session. Clients opened while the router is active
    /// are controlled immediately; earlier ones wait for the next claim.
    pub async fn register_client(&self) -> Uuid {
        let id = Uuid::new_v4();
        let controller = if self.state().await == Lifecycle::Active {
            Some(self.settings.generation.clone())
        } else {
            None
        };
        self.clients.write().await.insert(id, controller);
        id
    }

    /// Generation controlling a client, if any
    pub async fn controller(&self, client: Uuid) -> Option<String> {
        self.clients.read().await.get(&client).cloned().flatten()
    }

    /// Install, then activate. Reuses a completed generation of the same name.
    pub async fn start(&self) -> FestResult<()> {
        let reusable = self.mode().await == CacheMode::Tiered
            && self.storage.state(&self.settings.generation) == Some(GenerationState::Complete);

        if reusable {
            debug!("Generation {} already installed", self.settings.generation);
            self.set_state(Lifecycle::Installed).await;
        } else if let Err(e) = self.install().await {
            if !self.settings.fallback_to_network_only {
                return Err(e);
            }
            warn!("{}; continuing network-only", e);
            *self.mode.write().await = CacheMode::NetworkOnly;
            self.set_state(Lifecycle::Installed).await;
        }

        self.activate().await
    }

    /// Open a fresh generation and precache the manifest.
    ///
    /// Installation is all or nothing: if any manifest entry cannot be
    /// fetched the partial generation is removed and the router becomes
    /// redundant.
    pub async fn install(&self) -> FestResult<()> {
        self.set_state(Lifecycle::Installing).await;
        let generation = self.settings.generation.as_str();

        if self.mode().await == CacheMode::NetworkOnly {
            info!("Network-only mode: nothing to precache");
            self.set_state(Lifecycle::Installed).await;
            return Ok(());
        }

        // A building generation is left over from a crashed install
        self.storage.delete(generation).await?;
        self.storage.open(generation).await?;

        info!(
            "Installing cache generation {} ({} assets)",
            generation,
            self.settings.manifest.len()
        );

        let fetches = self
            .settings
            .manifest
            .iter()
            .map(|url| self.precache(generation, url.clone()));
        let failures: Vec<String> = join_all(fetches)
            .await
            .into_iter()
            .filter_map(Result::err)
            .map(|e| e.to_string())
            .collect();

        if !failures.is_empty() {
            if let Err(e) = self.storage.delete(generation).await {
                warn!("Failed to remove partial generation {}: {}", generation, e);
            }
            self.set_state(Lifecycle::Redundant).await;
            return Err(FestError::CacheInstall {
                generation: generation.to_string(),
                reason: failures.join("; "),
            });
        }

        self.storage.mark_complete(generation).await?;
        self.set_state(Lifecycle::Installed).await;
        info!("Installed cache generation {}", generation);
        Ok(())
    }

    async fn precache(&self, generation: &str, url: Url) -> FestResult<()> {
        let request = Request::get(url.clone());
        let response = self
            .network
            .fetch(request.clone())
            .await?
            .error_for_status(&url)?;
        self.storage.put(generation, &request, &response).await
    }

    /// Drop stale generations and claim every client.
    ///
    /// Without skip-waiting, activation first waits for in-flight requests
    /// to drain.
    pub async fn activate(&self) -> FestResult<()> {
        match self.state().await {
            Lifecycle::Installed => {}
            Lifecycle::Active => return Ok(()),
            other => {
                return Err(FestError::Internal(format!(
                    "cannot activate router while {}",
                    other
                )))
            }
        }

        if !self.settings.skip_waiting {
            self.wait_for_idle().await;
        }
        self.set_state(Lifecycle::Activating).await;

        let keep_current = self.mode().await == CacheMode::Tiered;
        for name in self.storage.keys().await? {
            if keep_current && name == self.settings.generation {
                continue;
            }
            self.storage.delete(&name).await?;
            info!("Removed stale cache generation {}", name);
        }

        let mut clients = self.clients.write().await;
        for controller in clients.values_mut() {
            *controller = Some(self.settings.generation.clone());
        }
        let claimed = clients.len();
        drop(clients);

        self.set_state(Lifecycle::Active).await;
        info!(
            "Cache generation {} active, claimed {} client(s)",
            self.settings.generation, claimed
        );
        Ok(())
    }

    async fn wait_for_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            debug!("Waiting for in-flight requests before activating");
            notified.await;
        }
    }

    /// Number of requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Answer a request. Never fails: anything unanswerable becomes a 503.
    pub async fn handle(&self, request: Request) -> Response {
        let _guard = InFlight::enter(&self.in_flight, &self.idle);

        let routed = self.state().await == Lifecycle::Active
            && self.mode().await == CacheMode::Tiered;
        if !routed {
            return self.network_only(request).await;
        }

        let class = self.routes.classify(&request.url);
        debug!("{} -> {}", request.identity(), class);

        match class {
            RequestClass::RemoteData => self.network_only(request).await,
            RequestClass::PinnedAsset => self.cache_first(request, true).await,
            RequestClass::NetworkFirst => self.network_first(request).await,
            RequestClass::Fallback => self.cache_first(request, false).await,
        }
    }

    async fn network_only(&self, request: Request) -> Response {
        let identity = request.identity();
        match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", identity, e);
                Response::unavailable()
            }
        }
    }

    async fn cache_first(&self, request: Request, populate: bool) -> Response {
        let cacheable = request.method == Method::Get;
        if cacheable {
            if let Some(hit) = self.lookup(&request).await {
                debug!("Cache hit for {}", request.identity());
                return hit;
            }
        }

        match self.network.fetch(request.clone()).await {
            Ok(response) => {
                if populate && cacheable && response.is_success() {
                    self.store(&request, &response).await;
                }
                response
            }
            Err(e) => {
                warn!("{} failed with no cached copy: {}", request.identity(), e);
                Response::unavailable()
            }
        }
    }

    async fn network_first(&self, request: Request) -> Response {
        let cacheable = request.method == Method::Get;
        match self.network.fetch(request.clone()).await {
            Ok(response) => {
                if cacheable && response.is_success() {
                    self.store(&request, &response).await;
                }
                response
            }
            Err(e) => {
                if cacheable {
                    if let Some(hit) = self.lookup(&request).await {
                        info!("Offline: serving cached {}", request.identity());
                        return hit;
                    }
                }
                warn!("{} failed with no cached copy: {}", request.identity(), e);
                Response::unavailable()
            }
        }
    }

    /// Cache read that degrades to a miss
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self
            .storage
            .lookup(&self.settings.generation, request)
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache read for {} failed: {}", request.identity(), e);
                None
            }
        }
    }

    /// Cache write that degrades to a no-op
    async fn store(&self, request: &Request, response: &Response) {
        let generation = &self.settings.generation;
        let result = async {
            self.storage.open(generation).await?;
            self.storage.put(generation, request, response).await
        }
        .await;

        if let Err(e) = result {
            warn!("Cache write for {} failed: {}", request.identity(), e);
        }
    }

    /// Generations on disk
    pub async fn status(&self) -> FestResult<Vec<GenerationInfo>> {
        self.storage.generations().await
    }

    /// Remove every generation
    pub async fn clear(&self) -> FestResult<usize> {
        let mut removed = 0;
        for name in self.storage.keys().await? {
            if self.storage.delete(&name).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl Fetcher for CacheRouter {
    async fn fetch(&self, request: Request) -> FestResult<Response> {
        Ok(self.handle(request).await)
    }
}
