//! Configuration schema for festboard
//!
//! Configuration is stored at `~/.config/festboard/config.toml`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Festival calendar
    pub festival: FestivalConfig,

    /// Leaderboard scoring policy
    pub scoring: ScoringConfig,

    /// Roster source
    pub roster: RosterConfig,

    /// Remote results store
    pub store: StoreConfig,

    /// Fetch cache settings
    pub cache: CacheConfig,

    /// Admin gate
    pub admin: AdminConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Origin the application assets are served from
    pub origin: String,

    /// Network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            origin: "http://localhost:8080/".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Festival calendar settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FestivalConfig {
    /// First festival day
    pub start_date: NaiveDate,

    /// Number of festival days events are spread over
    pub days: u32,

    /// Fixed "now" for the home view (RFC 3339 local time, e.g. 2026-02-20T09:00:00)
    pub now: Option<String>,
}

impl Default for FestivalConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap_or_default(),
            days: 4,
            now: None,
        }
    }
}

/// Scoring policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Award +1 per roster participant to their faculty
    pub participation_points: bool,

    /// Faculties always shown on the leaderboard, even at zero
    pub faculties: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            participation_points: false,
            faculties: vec![
                "ARTS,APPLIED SCIENCE, MUSIC".to_string(),
                "BSCHOOL( IMK,LAW,COMMERCE)".to_string(),
                "ORIENTAL, EDUCATION".to_string(),
                "SCIENCE".to_string(),
                "SOCIAL SCIENCE".to_string(),
            ],
        }
    }
}

/// Roster source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Roster location, absolute URL or path relative to the origin
    pub source: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            source: "program_wise_participant_list.json".to_string(),
        }
    }
}

/// Remote results store (JSONBin v3 wire format)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// API base URL
    pub base_url: String,

    /// Document (bin) identifier
    pub bin_id: String,

    /// Master key; FESTBOARD_STORE_KEY takes precedence
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jsonbin.io/v3".to_string(),
            bin_id: String::new(),
            api_key: None,
        }
    }
}

/// How aggressively the router caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Precache manifest, route by resource class
    #[default]
    Tiered,
    /// Never serve from cache; drop every generation on activation
    NetworkOnly,
}

/// Fetch cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache generation name; bump to force a clean rebuild
    pub generation: String,

    /// Routing mode
    pub mode: CacheMode,

    /// Activate a freshly installed generation without waiting for in-flight requests
    pub skip_waiting: bool,

    /// Keep serving (network-only) when install fails
    pub fallback_to_network_only: bool,

    /// Path extensions served network-first
    pub network_first_extensions: Vec<String>,

    /// Extra hosts treated as remote data (never cached)
    pub remote_hosts: Vec<String>,

    /// Cache root override; defaults to the state directory
    pub dir: Option<PathBuf>,

    /// Precache manifest
    pub manifest: ManifestConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: "arts-fest-v2".to_string(),
            mode: CacheMode::Tiered,
            skip_waiting: true,
            fallback_to_network_only: true,
            network_first_extensions: vec![
                "html".to_string(),
                "js".to_string(),
                "json".to_string(),
                "css".to_string(),
            ],
            remote_hosts: vec![],
            dir: None,
            manifest: ManifestConfig::default(),
        }
    }
}

/// Precache manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Local assets, relative to the origin
    pub local: Vec<String>,

    /// Pinned, versioned third-party URLs
    pub pinned: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            local: vec![
                "index.html".to_string(),
                "schedule.html".to_string(),
                "leaderboard.html".to_string(),
                "result.html".to_string(),
                "index.js".to_string(),
                "program_wise_participant_list.json".to_string(),
            ],
            pinned: vec![
                "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css"
                    .to_string(),
                "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js"
                    .to_string(),
            ],
        }
    }
}

/// Admin gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared operator password; admin commands are disabled when unset
    pub password: Option<String>,
}
