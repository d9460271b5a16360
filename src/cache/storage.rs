//! Directory-backed cache generations
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/<generation>/.complete        marker written when install finishes
//! <root>/<generation>/<key>.json       response metadata
//! <root>/<generation>/<key>.body       response body
//! ```
//!
//! Keys are a SHA256 prefix of the request identity. Both files are
//! written through a rename, metadata last. The metadata records a digest
//! of its body; when two writers race on one key and the pair ends up
//! mismatched, lookup treats the entry as a miss.

use crate::error::{FestError, FestResult};
use crate::fetch::{Request, Response, ResponseSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPLETE_MARKER: &str = ".complete";

/// State of a cache generation on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    /// Install in progress, or crashed mid-install
    Building,
    /// Install finished
    Complete,
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Summary of one generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationInfo {
    pub name: String,
    pub state: GenerationState,
    pub entries: usize,
}

/// Metadata stored next to each cached body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub identity: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub stored_at: DateTime<Utc>,
    /// SHA256 of the body file, hex encoded
    pub body_sha256: String,
}

/// All cache generations under one root
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

/// Cache key for a request: first 16 bytes of SHA256, hex encoded
pub fn cache_key(request: &Request) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.identity().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Write through a uniquely named temp file, then rename into place
async fn write_replacing(path: &Path, contents: &[u8]) -> FestResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents)
        .await
        .map_err(|e| FestError::io(format!("writing {}", tmp_path.display()), e))?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(FestError::io(format!("committing {}", path.display()), e));
    }
    Ok(())
}

/// Generation names become directory names
pub fn validate_generation(name: &str) -> FestResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(FestError::ConfigValue {
            key: "cache.generation".to_string(),
            reason: format!(
                "'{}' must be letters, digits, '-', '_' or '.', not starting with '.'",
                name
            ),
        })
    }
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    /// Names of all generations on disk
    pub async fn keys(&self) -> FestResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| FestError::io("reading cache root", e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FestError::io("reading cache root entry", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Create a generation (idempotent)
    pub async fn open(&self, generation: &str) -> FestResult<()> {
        validate_generation(generation)?;
        let dir = self.generation_dir(generation);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| FestError::io(format!("creating cache generation {}", dir.display()), e))
    }

    /// Delete a generation and everything in it
    pub async fn delete(&self, generation: &str) -> FestResult<bool> {
        let dir = self.generation_dir(generation);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| FestError::io(format!("deleting cache generation {}", dir.display()), e))?;
        debug!("Deleted cache generation {}", generation);
        Ok(true)
    }

    pub async fn mark_complete(&self, generation: &str) -> FestResult<()> {
        let marker = self.generation_dir(generation).join(COMPLETE_MARKER);
        fs::write(&marker, Utc::now().to_rfc3339())
            .await
            .map_err(|e| FestError::io("writing cache completion marker", e))
    }

    /// State of a generation, `None` when it does not exist
    pub fn state(&self, generation: &str) -> Option<GenerationState> {
        let dir = self.generation_dir(generation);
        if !dir.is_dir() {
            None
        } else if dir.join(COMPLETE_MARKER).exists() {
            Some(GenerationState::Complete)
        } else {
            Some(GenerationState::Building)
        }
    }

    /// Summaries of every generation
    pub async fn generations(&self) -> FestResult<Vec<GenerationInfo>> {
        let mut infos = Vec::new();
        for name in self.keys().await? {
            let entries = self.count_entries(&name).await?;
            let state = self.state(&name).unwrap_or(GenerationState::Building);
            infos.push(GenerationInfo {
                name,
                state,
                entries,
            });
        }
        Ok(infos)
    }

    async fn count_entries(&self, generation: &str) -> FestResult<usize> {
        let mut entries = fs::read_dir(self.generation_dir(generation))
            .await
            .map_err(|e| FestError::io("reading cache generation", e))?;

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FestError::io("reading cache entry", e))?
        {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Store a response, replacing any previous entry for the same request
    pub async fn put(
        &self,
        generation: &str,
        request: &Request,
        response: &Response,
    ) -> FestResult<()> {
        let dir = self.generation_dir(generation);
        let key = cache_key(request);

        let meta = CachedResponse {
            identity: request.identity(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            stored_at: Utc::now(),
            body_sha256: body_digest(&response.body),
        };

        write_replacing(&dir.join(format!("{}.body", key)), &response.body).await?;
        let content = serde_json::to_string_pretty(&meta)?;
        write_replacing(&dir.join(format!("{}.json", key)), content.as_bytes()).await?;

        debug!("Cached {} in {}", meta.identity, generation);
        Ok(())
    }

    /// Look up a cached response
    pub async fn lookup(&self, generation: &str, request: &Request) -> FestResult<Option<Response>> {
        let dir = self.generation_dir(generation);
        let key = cache_key(request);
        let meta_path = dir.join(format!("{}.json", key));

        if !meta_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path)
            .await
            .map_err(|e| FestError::io(format!("reading cache entry {}", meta_path.display()), e))?;
        let meta: CachedResponse =
            serde_json::from_str(&content).map_err(|e| FestError::CacheCorrupt {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        if meta.identity != request.identity() {
            warn!(
                "Cache key {} holds {} instead of {}",
                key,
                meta.identity,
                request.identity()
            );
            return Ok(None);
        }

        let body_path = dir.join(format!("{}.body", key));
        let body = fs::read(&body_path).await.map_err(|e| FestError::CacheCorrupt {
            key: key.clone(),
            reason: format!("missing body: {}", e),
        })?;

        if body_digest(&body) != meta.body_sha256 {
            warn!("Cache entry {} body does not match its metadata; ignoring", key);
            return Ok(None);
        }

        Ok(Some(Response {
            status: meta.status,
            status_text: meta.status_text,
            headers: meta.headers,
            body,
            source: ResponseSource::Cache,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    fn storage() -> (CacheStorage, TempDir) {
        let temp = TempDir::new().unwrap();
        (CacheStorage::new(temp.path().join("cache")), temp)
    }

    fn request(path: &str) -> Request {
        Request::get(Url::parse(&format!("https://fest.example.org/{}", path)).unwrap())
    }

    #[test]
    fn key_is_deterministic_and_method_aware() {
        let get = request("index.html");
        let mut put = get.clone();
        put.method = crate::fetch::Method::Put;

        assert_eq!(cache_key(&get), cache_key(&request("index.html")));
        assert_ne!(cache_key(&get), cache_key(&put));
        assert_eq!(cache_key(&get).len(), 32);
    }

    #[test]
    fn generation_names_are_checked() {
        assert!(validate_generation("arts-fest-v2").is_ok());
        assert!(validate_generation("../etc").is_err());
        assert!(validate_generation("").is_err());
        assert!(validate_generation(".hidden").is_err());
    }

    #[tokio::test]
    async fn put_then_lookup() {
        let (storage, _temp) = storage();
        storage.open("v1").await.unwrap();

        let req = request("index.html");
        storage
            .put("v1", &req, &Response::new(200, b"first".to_vec()))
            .await
            .unwrap();
        storage
            .put("v1", &req, &Response::new(200, b"second".to_vec()))
            .await
            .unwrap();

        let hit = storage.lookup("v1", &req).await.unwrap().unwrap();
        assert_eq!(hit.body, b"second");
        assert_eq!(hit.source, ResponseSource::Cache);

        assert!(storage.lookup("v1", &request("other.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn generations_listing_and_delete() {
        let (storage, _temp) = storage();
        assert!(storage.keys().await.unwrap().is_empty());

        storage.open("v1").await.unwrap();
        storage.open("v2").await.unwrap();
        storage
            .put("v2", &request("a.js"), &Response::new(200, vec![]))
            .await
            .unwrap();
        storage.mark_complete("v2").await.unwrap();

        let infos = storage.generations().await.unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].state, GenerationState::Building);
        assert_eq!(infos[1].state, GenerationState::Complete);
        assert_eq!(infos[1].entries, 1);

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn mismatched_body_is_a_miss() {
        let (storage, _temp) = storage();
        storage.open("v1").await.unwrap();
        let req = request("index.html");
        storage
            .put("v1", &req, &Response::new(200, b"index v1".to_vec()))
            .await
            .unwrap();

        // A racing writer replaced the body after our metadata landed
        let body = storage
            .root()
            .join("v1")
            .join(format!("{}.body", cache_key(&req)));
        std::fs::write(body, "index v2").unwrap();

        assert!(storage.lookup("v1", &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_puts_leave_a_consistent_entry() {
        let (storage, _temp) = storage();
        storage.open("v1").await.unwrap();
        let req = request("index.html");

        let writes = (0..8).map(|i| {
            let storage = storage.clone();
            let req = req.clone();
            tokio::spawn(async move {
                let body = format!("body {}", i).into_bytes();
                storage.put("v1", &req, &Response::new(200, body)).await
            })
        });
        for write in futures_util::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        if let Some(hit) = storage.lookup("v1", &req).await.unwrap() {
            assert!(String::from_utf8(hit.body).unwrap().starts_with("body "));
        }
        let leftovers = std::fs::read_dir(storage.root().join("v1"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        assert_eq!(storage.generations().await.unwrap()[0].entries, 1);
    }

    #[tokio::test]
    async fn corrupt_metadata_is_reported() {
        let (storage, _temp) = storage();
        storage.open("v1").await.unwrap();
        let req = request("index.html");
        let meta = storage
            .root()
            .join("v1")
            .join(format!("{}.json", cache_key(&req)));
        std::fs::write(meta, "not json").unwrap();

        let err = storage.lookup("v1", &req).await.unwrap_err();
        assert!(matches!(err, FestError::CacheCorrupt { .. }));
    }
}
