//! Request/response types and the network seam
//!
//! `Fetcher` behaves like a browser `fetch`: an HTTP error status is still a
//! response, only transport failures are errors. The cache router wraps a
//! `Fetcher` and is one itself, so every caller can be pointed at either.

use crate::error::{FestError, FestResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// An outbound request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn put(url: Url, body: Vec<u8>) -> Self {
        Self {
            method: Method::Put,
            url,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Identity used as the cache key
    pub fn identity(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Produced by the router when nothing else could answer
    Synthetic,
}

/// A response, from any source
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body,
            source: ResponseSource::Network,
        }
    }

    /// The 503 returned when neither network nor cache can answer
    pub fn unavailable() -> Self {
        Self {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: b"Network error - please check your connection.".to_vec(),
            source: ResponseSource::Synthetic,
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Fail with `HttpStatus` unless 2xx
    pub fn error_for_status(self, url: &Url) -> FestResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FestError::HttpStatus {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Anything that can answer a request
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. Only transport failures are errors.
    async fn fetch(&self, request: Request) -> FestResult<Response>;
}

/// Real network access: HTTP(S) through `ureq`, `file://` through the filesystem
#[derive(Clone)]
pub struct NetworkFetcher {
    agent: ureq::Agent,
}

impl NetworkFetcher {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }

    async fn fetch_file(request: &Request) -> FestResult<Response> {
        let path = request.url.to_file_path().map_err(|_| FestError::InvalidUrl {
            url: request.url.to_string(),
            reason: "not a local file path".to_string(),
        })?;

        if request.method != Method::Get {
            return Err(FestError::network(
                request.url.as_str(),
                "only GET is supported for file URLs",
            ));
        }

        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Response::new(200, body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut response = Response::new(404, Vec::new());
                response.status_text = "Not Found".to_string();
                Ok(response)
            }
            Err(e) => Err(FestError::network(request.url.as_str(), e)),
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_blocking(agent: &ureq::Agent, request: &Request) -> FestResult<Response> {
    let url = request.url.as_str();
    let body = request.body.as_deref().unwrap_or(&[]);

    let result = match request.method {
        Method::Get => with_headers(agent.get(url), &request.headers).call(),
        Method::Delete => with_headers(agent.delete(url), &request.headers).call(),
        Method::Put => with_headers(agent.put(url), &request.headers).send(body),
        Method::Post => with_headers(agent.post(url), &request.headers).send(body),
    };

    let mut response = result.map_err(|e| FestError::network(url, e))?;

    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| FestError::network(url, e))?;

    Ok(Response {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
        source: ResponseSource::Network,
    })
}

#[async_trait]
impl Fetcher for NetworkFetcher {
    async fn fetch(&self, request: Request) -> FestResult<Response> {
        debug!("Fetching {}", request.identity());

        if request.url.scheme() == "file" {
            return Self::fetch_file(&request).await;
        }

        let agent = self.agent.clone();
        let url = request.url.to_string();
        tokio::task::spawn_blocking(move || send_blocking(&agent, &request))
            .await
            .map_err(|e| FestError::network(url, format!("fetch task failed: {}", e)))?
    }
}
