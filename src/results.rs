//! Published results and their wire format
//!
//! Records are validated once, when they are read from the store. Anything
//! without a program, a winner faculty or a recognisable position is
//! rejected here and never reaches scoring or the views.

use crate::error::{FestError, FestResult};
use crate::roster::Participant;
use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Podium position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    First,
    Second,
    Third,
}

impl Position {
    /// Parse "1"/"2"/"3" (string or number)
    pub fn from_value(value: &Value) -> Option<Self> {
        let n = match value {
            Value::String(s) => s.trim().parse::<u64>().ok()?,
            Value::Number(n) => n.as_u64()?,
            _ => return None,
        };
        Self::from_rank(n)
    }

    pub fn from_rank(rank: u64) -> Option<Self> {
        match rank {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    /// Medal label used by the views ("1st", "2nd", "3rd")
    pub fn label(&self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rank().to_string())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid position {}", value)))
    }
}

/// Kind of event, which selects the points table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Individual,
    Group,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// One published result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub program: String,

    pub winner: Participant,

    pub position: Position,

    /// Points fixed when the result was entered; absent on legacy records
    #[serde(
        default,
        deserialize_with = "lenient_points",
        skip_serializing_if = "Option::is_none"
    )]
    pub points: Option<u32>,

    #[serde(
        rename = "eventType",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<EventType>,

    #[serde(
        rename = "timestamp",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept integers and numeric strings; anything negative, fractional or
/// non-numeric counts as missing.
fn lenient_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

/// Optional field that degrades to `None` instead of rejecting the record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Validate one raw record; `index` is its position in the document
pub fn parse_record(index: usize, value: &Value) -> Option<ResultEntry> {
    match serde_json::from_value::<ResultEntry>(value.clone()) {
        Ok(entry) if entry.program.trim().is_empty() => {
            warn!("Rejecting result #{} with empty program", index + 1);
            None
        }
        Ok(entry) if entry.winner.faculty.trim().is_empty() => {
            warn!("Rejecting result #{} with no winner faculty", index + 1);
            None
        }
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Rejecting invalid result #{}: {}", index + 1, e);
            None
        }
    }
}

/// Usable records paired with their position in the raw document
pub fn parse_indexed(raw: &[Value]) -> Vec<(usize, ResultEntry)> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, value)| parse_record(index, value).map(|entry| (index, entry)))
        .collect()
}

/// Validate raw records, dropping the ones that cannot be used
pub fn parse_records(raw: &[Value]) -> Vec<ResultEntry> {
    parse_indexed(raw).into_iter().map(|(_, entry)| entry).collect()
}

/// Extract the `record` array from a store envelope.
///
/// A missing or non-array `record` is an empty sequence; a body that is not
/// JSON at all is an error.
pub fn envelope_records(bytes: &[u8]) -> FestResult<Vec<Value>> {
    let envelope: Value = serde_json::from_slice(bytes)
        .map_err(|e| FestError::MalformedEnvelope(e.to_string()))?;

    match envelope.get("record") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => {
            warn!("Envelope record is {}, expected an array", json_kind(other));
            Ok(Vec::new())
        }
        None => {
            warn!("Envelope has no record field");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_original_wire_shape() {
        let raw = vec![json!({
            "program": "Solo Song",
            "winner": {"NAME": "A", "FACULTY": "SCIENCE"},
            "position": "1",
            "points": 5,
            "timestamp": "2026-02-20T10:15:00.000Z"
        })];

        let records = parse_records(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, Position::First);
        assert_eq!(records[0].points, Some(5));
        assert!(records[0].created_at.is_some());
    }

    #[test]
    fn lenient_points_and_position() {
        let raw = vec![
            json!({"program": "Mime", "winner": {"NAME": "B", "FACULTY": "ARTS"}, "position": 2, "points": "3"}),
            json!({"program": "Mime", "winner": {"NAME": "C", "FACULTY": "ARTS"}, "position": "3", "points": -4}),
            json!({"program": "Mime", "winner": {"NAME": "D", "FACULTY": "ARTS"}, "position": "3", "points": "lots"}),
        ];

        let records = parse_records(&raw);
        assert_eq!(records[0].position, Position::Second);
        assert_eq!(records[0].points, Some(3));
        assert_eq!(records[1].points, None);
        assert_eq!(records[2].points, None);
    }

    #[test]
    fn rejects_unusable_records() {
        let raw = vec![
            json!({"program": "Mime", "position": "1"}),
            json!({"program": "Mime", "winner": {"NAME": "B", "FACULTY": "ARTS"}, "position": "7"}),
            json!({"program": " ", "winner": {"NAME": "B", "FACULTY": "ARTS"}, "position": "1"}),
            json!("garbage"),
        ];

        assert!(parse_records(&raw).is_empty());
    }

    #[test]
    fn winner_name_is_optional() {
        let raw = vec![
            json!({"program": "Mime", "winner": {"FACULTY": "ARTS"}, "position": "1", "points": 5}),
            json!({"program": "Mime", "winner": {"NAME": "B", "FACULTY": " "}, "position": "2"}),
        ];

        let records = parse_records(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].winner.faculty, "ARTS");
        assert_eq!(records[0].winner.name, "");
    }

    #[test]
    fn indexed_parse_keeps_document_positions() {
        let raw = vec![
            json!({"program": "Broken"}),
            json!({"program": "Mime", "winner": {"NAME": "B", "FACULTY": "ARTS"}, "position": "1"}),
            json!(null),
            json!({"program": "Essay", "winner": {"NAME": "C", "FACULTY": "SCIENCE"}, "position": "2"}),
        ];

        let slots: Vec<usize> = parse_indexed(&raw).into_iter().map(|(i, _)| i).collect();
        assert_eq!(slots, vec![1, 3]);
    }

    #[test]
    fn bad_timestamp_is_dropped_not_fatal() {
        let raw = vec![json!({
            "program": "Mime",
            "winner": {"NAME": "B", "FACULTY": "ARTS"},
            "position": "1",
            "timestamp": "yesterday"
        })];

        let records = parse_records(&raw);
        assert_eq!(records.len(), 1);
        assert!(records[0].created_at.is_none());
    }

    #[test]
    fn position_serializes_as_string() {
        let entry = ResultEntry {
            program: "Mime".to_string(),
            winner: Participant::new("B", "ARTS"),
            position: Position::Second,
            points: Some(3),
            event_type: Some(EventType::Individual),
            created_at: None,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["position"], json!("2"));
        assert_eq!(value["eventType"], json!("individual"));
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn envelope_defaults() {
        assert_eq!(envelope_records(br#"{"record": [1, 2]}"#).unwrap().len(), 2);
        assert!(envelope_records(br#"{"record": {}}"#).unwrap().is_empty());
        assert!(envelope_records(br#"{"metadata": {}}"#).unwrap().is_empty());
        assert!(matches!(
            envelope_records(b"<html>"),
            Err(FestError::MalformedEnvelope(_))
        ));
    }
}
