//! Participant roster
//!
//! The roster is a static JSON object mapping each event name to its
//! participants. File order is kept: it breaks ties when the schedule
//! sorts events that land in the same slot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One registered participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Optional on result winners; required in the roster
    #[serde(rename = "NAME", default)]
    pub name: String,

    #[serde(rename = "FACULTY")]
    pub faculty: String,
}

impl Participant {
    pub fn new(name: impl Into<String>, faculty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faculty: faculty.into(),
        }
    }
}

/// Event name to participant list, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    events: IndexMap<String, Vec<Participant>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a roster document, dropping anything that is not a well-formed participant.
    ///
    /// A document that is not a JSON object yields an empty roster.
    pub fn from_json(bytes: &[u8]) -> Self {
        let raw: IndexMap<String, Value> = match serde_json::from_slice(bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Roster is not a JSON object, treating as empty: {}", e);
                return Self::default();
            }
        };

        let mut roster = Self::default();
        for (event, value) in raw {
            let Value::Array(items) = value else {
                warn!("Roster entry for {} is not a list, skipping", event);
                continue;
            };

            let mut participants = Vec::with_capacity(items.len());
            for item in items {
                match serde_json::from_value::<Participant>(item) {
                    Ok(p) if p.name.trim().is_empty() => {
                        warn!("Dropping participant without a name in {}", event)
                    }
                    Ok(p) => participants.push(p),
                    Err(e) => warn!("Dropping malformed participant in {}: {}", event, e),
                }
            }
            roster.events.insert(event, participants);
        }

        debug!("Parsed roster with {} events", roster.len());
        roster
    }

    /// Add or replace an event
    pub fn insert(&mut self, event: impl Into<String>, participants: Vec<Participant>) {
        self.events.insert(event.into(), participants);
    }

    /// Event names in roster order
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    /// Participants registered for an event (empty when unknown)
    pub fn participants(&self, event: &str) -> &[Participant] {
        self.events.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every participant across all events
    pub fn all_participants(&self) -> impl Iterator<Item = &Participant> {
        self.events.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<(String, Vec<Participant>)> for Roster {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Participant>)>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
