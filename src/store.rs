//! Remote results store
//!
//! The store holds one document: an envelope whose `record` field is the
//! full, ordered sequence of published results. Writes replace the whole
//! document, guarded by a version check against the last read.
//!
//! Stores deal in raw JSON elements. Records this client cannot read are
//! still part of the document and are written back untouched.

use crate::config::{self, Config};
use crate::error::{FestError, FestResult};
use crate::fetch::{Fetcher, Request};
use crate::results::{envelope_records, parse_indexed, parse_records, ResultEntry};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// The results document as read from the store, with its version
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Every element of the `record` array, usable or not
    pub raw: Vec<Value>,
    pub version: String,
}

impl Snapshot {
    pub fn new(raw: Vec<Value>) -> Self {
        let version = version_of(&raw);
        Self { raw, version }
    }

    /// Usable records; invalid elements are skipped with a warning
    pub fn records(&self) -> Vec<ResultEntry> {
        parse_records(&self.raw)
    }

    /// Usable records with their position in `raw`
    pub fn entries(&self) -> Vec<(usize, ResultEntry)> {
        parse_indexed(&self.raw)
    }
}

/// Version token for a raw record array.
///
/// `serde_json` maps keep their keys sorted, so equal documents hash
/// equally whatever order the store returned the fields in.
pub fn version_of(raw: &[Value]) -> String {
    let canonical = Value::Array(raw.to_vec()).to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Persistence for the results sequence
#[async_trait]
pub trait ResultsStore: Send + Sync {
    /// Read the whole document
    async fn read_latest(&self) -> FestResult<Snapshot>;

    /// Replace the whole document, failing with `StoreConflict` if the
    /// remote changed since `expected_version` was read. Returns the new
    /// version.
    async fn replace_all(&self, raw: &[Value], expected_version: &str) -> FestResult<String>;
}

/// JSONBin-style HTTP store, reached through a `Fetcher`
pub struct HttpStore {
    fetcher: Arc<dyn Fetcher>,
    base_url: Url,
    bin_id: String,
    api_key: Option<String>,
}

impl HttpStore {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        base_url: Url,
        bin_id: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            base_url,
            bin_id: bin_id.into(),
            api_key,
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> FestResult<Self> {
        if config.store.bin_id.trim().is_empty() {
            return Err(FestError::ConfigValue {
                key: "store.bin_id".to_string(),
                reason: "no results document configured".to_string(),
            });
        }

        Ok(Self::new(
            fetcher,
            config::parse_url(&config.store.base_url)?,
            config.store.bin_id.trim(),
            config::store_key(config),
        ))
    }

    fn bin_url(&self, suffix: &str) -> FestResult<Url> {
        let raw = format!(
            "{}/b/{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.bin_id,
            suffix
        );
        config::parse_url(&raw)
    }

    fn authorize(&self, request: Request) -> Request {
        match &self.api_key {
            Some(key) => request.with_header(MASTER_KEY_HEADER, key.as_str()),
            None => request,
        }
    }

    async fn read_raw(&self) -> FestResult<Vec<Value>> {
        let url = self.bin_url("/latest")?;
        let request = self.authorize(Request::get(url.clone()));
        let response = self
            .fetcher
            .fetch(request)
            .await?
            .error_for_status(&url)?;
        envelope_records(&response.body)
    }
}

#[async_trait]
impl ResultsStore for HttpStore {
    async fn read_latest(&self) -> FestResult<Snapshot> {
        let snapshot = Snapshot::new(self.read_raw().await?);
        debug!(
            "Read {} results at version {}",
            snapshot.raw.len(),
            snapshot.version
        );
        Ok(snapshot)
    }

    async fn replace_all(&self, raw: &[Value], expected_version: &str) -> FestResult<String> {
        if self.api_key.is_none() {
            return Err(FestError::StoreKeyMissing);
        }

        let current = version_of(&self.read_raw().await?);
        if current != expected_version {
            return Err(FestError::StoreConflict {
                expected: expected_version.to_string(),
                found: current,
            });
        }

        let url = self.bin_url("")?;
        let body = serde_json::to_vec(raw)?;
        let request = self
            .authorize(Request::put(url.clone(), body))
            .with_header("Content-Type", "application/json");
        self.fetcher
            .fetch(request)
            .await?
            .error_for_status(&url)?;

        let version = version_of(raw);
        info!("Stored {} results, version {}", raw.len(), version);
        Ok(version)
    }
}

/// In-process store for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    raw: Vec<Value>,
    fail_next_write: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw document, which may hold unusable elements
    pub fn with_raw(raw: Vec<Value>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                raw,
                ..Default::default()
            }),
        }
    }

    pub fn with_records(records: Vec<ResultEntry>) -> Self {
        Self::with_raw(
            records
                .iter()
                .filter_map(|r| serde_json::to_value(r).ok())
                .collect(),
        )
    }

    /// Make the next `replace_all` fail with a network error
    pub async fn fail_next_write(&self, reason: impl Into<String>) {
        self.inner.lock().await.fail_next_write = Some(reason.into());
    }

    /// Overwrite the stored document as another writer would
    pub async fn overwrite(&self, raw: Vec<Value>) {
        self.inner.lock().await.raw = raw;
    }

    /// Usable records currently stored
    pub async fn records(&self) -> Vec<ResultEntry> {
        parse_records(&self.inner.lock().await.raw)
    }

    pub async fn raw(&self) -> Vec<Value> {
        self.inner.lock().await.raw.clone()
    }

    /// Successful writes so far
    pub async fn writes(&self) -> usize {
        self.inner.lock().await.writes
    }
}

#[async_trait]
impl ResultsStore for MemoryStore {
    async fn read_latest(&self) -> FestResult<Snapshot> {
        Ok(Snapshot::new(self.inner.lock().await.raw.clone()))
    }

    async fn replace_all(&self, raw: &[Value], expected_version: &str) -> FestResult<String> {
        let mut inner = self.inner.lock().await;

        if let Some(reason) = inner.fail_next_write.take() {
            return Err(FestError::network("memory://results", reason));
        }

        let current = version_of(&inner.raw);
        if current != expected_version {
            return Err(FestError::StoreConflict {
                expected: expected_version.to_string(),
                found: current,
            });
        }

        inner.raw = raw.to_vec();
        inner.writes += 1;
        Ok(version_of(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::NetworkFetcher;
    use crate::results::Position;
    use crate::roster::Participant;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(program: &str) -> ResultEntry {
        ResultEntry {
            program: program.to_string(),
            winner: Participant::new("A", "SCIENCE"),
            position: Position::First,
            points: Some(5),
            event_type: None,
            created_at: None,
        }
    }

    fn raw(program: &str) -> Value {
        serde_json::to_value(entry(program)).unwrap()
    }

    fn http_store(server: &MockServer, key: Option<&str>) -> HttpStore {
        HttpStore::new(
            Arc::new(NetworkFetcher::new(Duration::from_secs(5))),
            Url::parse(&server.uri()).unwrap(),
            "bin123",
            key.map(str::to_string),
        )
    }

    fn envelope(records: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "record": records,
            "metadata": {"id": "bin123", "private": true}
        }))
    }

    #[test]
    fn version_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"[{"program":"Mime","position":"1"}]"#).unwrap();
        let b: Value = serde_json::from_str(r#"[{"position":"1","program":"Mime"}]"#).unwrap();
        assert_eq!(
            version_of(a.as_array().unwrap()),
            version_of(b.as_array().unwrap())
        );
        assert_ne!(version_of(a.as_array().unwrap()), version_of(&[]));
    }

    #[tokio::test]
    async fn http_read_latest_parses_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bin123/latest"))
            .and(header("x-master-key", "k"))
            .respond_with(envelope(json!([
                {"program": "Solo Song", "winner": {"NAME": "A", "FACULTY": "SCIENCE"}, "position": "1", "points": 5},
                {"program": "Broken"}
            ])))
            .mount(&server)
            .await;

        let snapshot = http_store(&server, Some("k")).read_latest().await.unwrap();
        assert_eq!(snapshot.raw.len(), 2);
        let records = snapshot.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].program, "Solo Song");
        assert_eq!(snapshot.entries()[0].0, 0);
        assert_eq!(snapshot.version.len(), 32);
    }

    #[tokio::test]
    async fn http_missing_record_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {}})))
            .mount(&server)
            .await;

        let snapshot = http_store(&server, None).read_latest().await.unwrap();
        assert!(snapshot.raw.is_empty());
    }

    #[tokio::test]
    async fn http_non_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = http_store(&server, None).read_latest().await.unwrap_err();
        assert!(matches!(err, FestError::MalformedEnvelope(_)));
    }

    #[tokio::test]
    async fn http_replace_all_puts_whole_sequence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bin123/latest"))
            .respond_with(envelope(json!([])))
            .mount(&server)
            .await;
        let records = vec![raw("Solo Song")];
        Mock::given(method("PUT"))
            .and(path("/b/bin123"))
            .and(header("x-master-key", "k"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!(records)))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = http_store(&server, Some("k"));
        let before = store.read_latest().await.unwrap();
        let version = store.replace_all(&records, &before.version).await.unwrap();
        assert_ne!(version, before.version);
    }

    #[tokio::test]
    async fn http_replace_all_detects_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(envelope(json!([
                {"program": "Mime", "winner": {"NAME": "B", "FACULTY": "ARTS"}, "position": "2"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let stale = version_of(&[]);
        let err = http_store(&server, Some("k"))
            .replace_all(&[raw("Solo Song")], &stale)
            .await
            .unwrap_err();
        assert!(matches!(err, FestError::StoreConflict { .. }));
    }

    #[tokio::test]
    async fn http_write_requires_key() {
        let server = MockServer::start().await;
        let err = http_store(&server, None)
            .replace_all(&[], &version_of(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, FestError::StoreKeyMissing));
    }

    #[tokio::test]
    async fn http_write_failure_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(envelope(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = http_store(&server, Some("bad"))
            .replace_all(&[raw("Mime")], &version_of(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, FestError::HttpStatus { status: 401, .. }));
    }

    #[tokio::test]
    async fn memory_store_versions_and_conflicts() {
        let store = MemoryStore::new();
        let first = store.read_latest().await.unwrap();

        let v2 = store
            .replace_all(&[raw("Mime")], &first.version)
            .await
            .unwrap();
        assert_eq!(store.read_latest().await.unwrap().version, v2);

        let err = store.replace_all(&[], &first.version).await.unwrap_err();
        assert!(matches!(err, FestError::StoreConflict { .. }));
        assert_eq!(store.writes().await, 1);

        // Another writer lands between read and write
        let seen = store.read_latest().await.unwrap();
        store.overwrite(vec![raw("Essay")]).await;
        assert!(store.replace_all(&[], &seen.version).await.is_err());
    }

    #[test]
    fn from_config_requires_bin() {
        let config = Config::default();
        let fetcher: Arc<dyn Fetcher> = Arc::new(NetworkFetcher::new(Duration::from_secs(1)));
        assert!(HttpStore::from_config(&config, fetcher).is_err());
    }
}
