//! Request classification
//!
//! Every URL falls into exactly one class. The checks run in priority
//! order: remote data first, because it must never be cached whatever its
//! extension looks like.

use crate::config::{self, Config};
use crate::error::FestResult;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Routing class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    /// Results store or `api.*` host: network only, never cached
    RemoteData,
    /// Versioned third-party URL from the manifest: cache first
    PinnedAsset,
    /// Same-origin page, script or data file: network first, refresh cache
    NetworkFirst,
    /// Anything else: cache first, network fallback without populating
    Fallback,
}

impl RequestClass {
    pub fn all() -> &'static [Self] {
        &[
            Self::RemoteData,
            Self::PinnedAsset,
            Self::NetworkFirst,
            Self::Fallback,
        ]
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RemoteData => "remote-data",
            Self::PinnedAsset => "pinned-asset",
            Self::NetworkFirst => "network-first",
            Self::Fallback => "fallback",
        };
        write!(f, "{}", name)
    }
}

/// Classification rules built from configuration
#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Url,
    remote_hosts: Vec<String>,
    pinned: HashSet<String>,
    network_first_extensions: Vec<String>,
}

impl RouteTable {
    pub fn new(
        origin: Url,
        remote_hosts: Vec<String>,
        pinned: &[Url],
        network_first_extensions: &[String],
    ) -> Self {
        Self {
            origin,
            remote_hosts: remote_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            pinned: pinned.iter().map(|u| u.as_str().to_string()).collect(),
            network_first_extensions: network_first_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Build from configuration; the results store host is always remote data
    pub fn from_config(config: &Config) -> FestResult<Self> {
        let origin = config::origin_url(config)?;

        let mut remote_hosts = config.cache.remote_hosts.clone();
        if let Some(host) = config::parse_url(&config.store.base_url)?.host_str() {
            remote_hosts.push(host.to_string());
        }

        let pinned = config
            .cache
            .manifest
            .pinned
            .iter()
            .map(|p| config::parse_url(p))
            .collect::<FestResult<Vec<_>>>()?;

        Ok(Self::new(
            origin,
            remote_hosts,
            &pinned,
            &config.cache.network_first_extensions,
        ))
    }

    /// Classify a URL
    pub fn classify(&self, url: &Url) -> RequestClass {
        if self.is_remote_data(url) {
            RequestClass::RemoteData
        } else if self.pinned.contains(url.as_str()) {
            RequestClass::PinnedAsset
        } else if self.is_network_first(url) {
            RequestClass::NetworkFirst
        } else {
            RequestClass::Fallback
        }
    }

    fn is_remote_data(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                let host = host.to_ascii_lowercase();
                host.starts_with("api.") || self.remote_hosts.iter().any(|h| *h == host)
            }
            None => false,
        }
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }

    fn is_network_first(&self, url: &Url) -> bool {
        if !self.is_same_origin(url) {
            return false;
        }

        let path = url.path();
        // Directory paths serve index pages
        if path.ends_with('/') {
            return true;
        }

        let file = path.rsplit('/').next().unwrap_or_default();
        match file.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.network_first_extensions.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }
}
