//! Operator workflow: publish, delete, backup
//!
//! An `AdminSession` holds the results document as last read from the
//! store. Each mutation is applied locally, then written as a whole
//! document. If the write fails the local copy is put back exactly as it
//! was. Elements the session cannot read are carried through every write.

use crate::config::Config;
use crate::error::{FestError, FestResult};
use crate::results::{EventType, Position, ResultEntry};
use crate::roster::Participant;
use crate::scoring::points_for;
use crate::store::ResultsStore;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// Operator input for a new result
#[derive(Debug, Clone)]
pub struct ResultDraft {
    pub program: String,
    pub winner_name: String,
    pub faculty: String,
    pub position: Position,
    pub event_type: EventType,
}

/// Check the operator password.
///
/// A plain comparison against `[admin] password`; no password configured
/// means admin commands are off.
pub fn verify_password(config: &Config, supplied: Option<&str>) -> FestResult<()> {
    let Some(expected) = config.admin.password.as_deref().filter(|p| !p.is_empty()) else {
        return Err(FestError::AdminDisabled);
    };

    match supplied {
        Some(given) if given == expected => Ok(()),
        _ => Err(FestError::AdminDenied),
    }
}

/// Backup file name for a day
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("festboard-backup-{}.json", date.format("%Y-%m-%d"))
}

pub struct AdminSession {
    store: Arc<dyn ResultsStore>,
    document: Document,
    version: String,
    faculties: Vec<String>,
}

/// The raw record array plus the usable records found in it
#[derive(Debug, Clone, Default)]
struct Document {
    raw: Vec<Value>,
    records: Vec<ResultEntry>,
    /// Position in `raw` of each entry in `records`
    slots: Vec<usize>,
}

impl Document {
    fn push(&mut self, entry: ResultEntry) -> FestResult<()> {
        self.raw.push(serde_json::to_value(&entry)?);
        self.slots.push(self.raw.len() - 1);
        self.records.push(entry);
        Ok(())
    }

    fn remove(&mut self, index: usize) -> ResultEntry {
        let slot = self.slots.remove(index);
        self.raw.remove(slot);
        for later in self.slots.iter_mut().skip(index) {
            *later -= 1;
        }
        self.records.remove(index)
    }
}

impl AdminSession {
    /// Read the current results. `faculties` restricts accepted winner
    /// faculties; empty accepts any.
    pub async fn open(store: Arc<dyn ResultsStore>, faculties: Vec<String>) -> FestResult<Self> {
        let snapshot = store.read_latest().await?;
        let (slots, records) = snapshot.entries().into_iter().unzip();
        let document = Document {
            raw: snapshot.raw,
            records,
            slots,
        };

        let unreadable = document.raw.len() - document.records.len();
        if unreadable > 0 {
            warn!(
                "{} stored result(s) are unreadable; they are kept as they are",
                unreadable
            );
        }
        info!(
            "Admin session opened with {} results at version {}",
            document.records.len(),
            snapshot.version
        );
        Ok(Self {
            store,
            document,
            version: snapshot.version,
            faculties,
        })
    }

    /// Results in publication order
    pub fn records(&self) -> &[ResultEntry] {
        &self.document.records
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn validate(&self, draft: &ResultDraft) -> FestResult<ResultEntry> {
        let program = draft.program.trim();
        let name = draft.winner_name.trim();
        let faculty = draft.faculty.trim();

        for (field, value) in [("program", program), ("winner", name), ("faculty", faculty)] {
            if value.is_empty() {
                return Err(FestError::InvalidResult(format!("{} must not be empty", field)));
            }
        }

        let faculty = if self.faculties.is_empty() {
            faculty.to_string()
        } else {
            self.faculties
                .iter()
                .find(|f| f.trim().eq_ignore_ascii_case(faculty))
                .cloned()
                .ok_or_else(|| {
                    FestError::InvalidResult(format!(
                        "unknown faculty '{}', expected one of: {}",
                        faculty,
                        self.faculties.join(" | ")
                    ))
                })?
        };

        Ok(ResultEntry {
            program: program.to_string(),
            winner: Participant::new(name, faculty),
            position: draft.position,
            points: Some(points_for(draft.event_type, draft.position)),
            event_type: Some(draft.event_type),
            created_at: Some(Utc::now()),
        })
    }

    /// Append a result and write the sequence
    pub async fn publish(&mut self, draft: ResultDraft) -> FestResult<ResultEntry> {
        let entry = self.validate(&draft)?;

        let before = self.document.clone();
        self.document.push(entry.clone())?;

        match self.store.replace_all(&self.document.raw, &self.version).await {
            Ok(version) => {
                self.version = version;
                info!(
                    "Published {} {} for {} ({} points)",
                    entry.program,
                    entry.position.label(),
                    entry.winner.faculty,
                    entry.points.unwrap_or_default()
                );
                Ok(entry)
            }
            Err(e) => {
                warn!("Publish failed, rolling back: {}", e);
                self.document = before;
                Err(e)
            }
        }
    }

    /// Remove the result at `index` (publication order) and write the sequence
    pub async fn delete(&mut self, index: usize) -> FestResult<ResultEntry> {
        if index >= self.document.records.len() {
            return Err(FestError::ResultIndex {
                index,
                len: self.document.records.len(),
            });
        }

        let before = self.document.clone();
        let removed = self.document.remove(index);

        match self.store.replace_all(&self.document.raw, &self.version).await {
            Ok(version) => {
                self.version = version;
                info!("Deleted result for {}", removed.program);
                Ok(removed)
            }
            Err(e) => {
                warn!("Delete failed, restoring: {}", e);
                self.document = before;
                Err(e)
            }
        }
    }

    /// Write the whole document as pretty JSON, unreadable elements included.
    ///
    /// `target` may be a directory, in which case the dated default file
    /// name is used inside it.
    pub async fn backup(&self, target: &Path) -> FestResult<PathBuf> {
        let path = if target.is_dir() {
            target.join(backup_file_name(Utc::now().date_naive()))
        } else {
            target.to_path_buf()
        };

        let content = serde_json::to_string_pretty(&self.document.raw)?;
        fs::write(&path, content)
            .await
            .map_err(|e| FestError::io(format!("writing backup to {}", path.display()), e))?;

        info!("Backed up {} results to {}", self.document.raw.len(), path.display());
        Ok(path)
    }
}
