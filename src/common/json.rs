use crate::UpqueueResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Any JSON scalar the server may put in an id or a display field
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Bool(_) => None,
        }
    }
}

/// Key of one tracked upload, numbers are kept in their decimal form
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Scalar::deserialize(deserializer).map(|s| ItemId(s.into_text()))
    }
}

/// State of an upload as reported by the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum UploadStatus {
    Initializing,
    Uploading,
    Processing,
    Done,
    Error,
    /// anything else, still running
    Other(String),
}

impl UploadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UploadStatus::Initializing => "Initializing",
            UploadStatus::Uploading => "Uploading",
            UploadStatus::Processing => "Processing",
            UploadStatus::Done => "Done",
            UploadStatus::Error => "Error",
            UploadStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error)
    }
}

impl From<String> for UploadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Initializing" => UploadStatus::Initializing,
            "Uploading" => UploadStatus::Uploading,
            "Processing" => UploadStatus::Processing,
            "Done" => UploadStatus::Done,
            "Error" => UploadStatus::Error,
            _ => UploadStatus::Other(s),
        }
    }
}

impl From<UploadStatus> for String {
    fn from(status: UploadStatus) -> Self {
        match status {
            UploadStatus::Other(s) => s,
            status => status.as_str().to_string(),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn display_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn percent_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(|s| s.as_number()))
}

/// One entry of the status endpoint's response
///
/// Only `id` is required. The display fields are passed through to the
/// queue view as they come.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadStatusItem {
    pub id: ItemId,

    #[serde(default)]
    pub status: Option<UploadStatus>,

    #[serde(default, deserialize_with = "display_field")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "display_field")]
    pub filename: Option<String>,

    #[serde(default, deserialize_with = "percent_field")]
    pub percent: Option<f64>,

    #[serde(default, deserialize_with = "display_field")]
    pub total: Option<String>,

    #[serde(default, deserialize_with = "display_field")]
    pub uploaded: Option<String>,

    #[serde(default, deserialize_with = "display_field")]
    pub speed: Option<String>,
}

impl UploadStatusItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            status: None,
            message: None,
            filename: None,
            percent: None,
            total: None,
            uploaded: None,
            speed: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().map_or(false, UploadStatus::is_terminal)
    }

    /// Text destined for `slot`, `None` when the server left the field out
    pub fn slot_value(&self, slot: Slot) -> Option<String> {
        match slot {
            Slot::Status => self.status.as_ref().map(|s| s.to_string()),
            Slot::Message => self.message.clone(),
            Slot::Filename => self.filename.clone(),
            Slot::Progress => self.percent.map(|p| format!("{}%", p)),
            Slot::Total => self.total.clone(),
            Slot::Uploaded => self.uploaded.clone(),
            Slot::Speed => self.speed.clone(),
        }
    }
}

/// Sub-elements of a queue item that receive updates, by css class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Status,
    Message,
    Filename,
    Progress,
    Total,
    Uploaded,
    Speed,
}

impl Slot {
    pub const ALL: [Slot; 7] = [
        Slot::Status,
        Slot::Message,
        Slot::Filename,
        Slot::Progress,
        Slot::Total,
        Slot::Uploaded,
        Slot::Speed,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            Slot::Status => "status",
            Slot::Message => "message",
            Slot::Filename => "filename",
            Slot::Progress => "progress",
            Slot::Total => "total",
            Slot::Uploaded => "uploaded",
            Slot::Speed => "speed",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        Slot::ALL.iter().copied().find(|s| s.class_name() == class)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Parse a status endpoint body. `None` means nothing to report.
pub fn parse_poll_response(body: &str) -> UpqueueResult<Option<Vec<UploadStatusItem>>> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let items: Option<Vec<UploadStatusItem>> = serde_json::from_str(body)?;

    Ok(items.filter(|items| !items.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_null_bodies_report_nothing() {
        assert!(parse_poll_response("").unwrap().is_none());
        assert!(parse_poll_response("  \n").unwrap().is_none());
        assert!(parse_poll_response("null").unwrap().is_none());
        assert!(parse_poll_response("[]").unwrap().is_none());
    }

    #[test]
    fn parses_server_item() {
        let body = r#"[{"id":"1804289383","status":"Uploading","message":"",
            "filename":"a.png","percent":42,"uploaded":"1.5 kB",
            "total":"3.5 kB","speed":"512.0 B/s"}]"#;

        let items = parse_poll_response(body).unwrap().unwrap();
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert_eq!(item.id.as_str(), "1804289383");
        assert_eq!(item.status, Some(UploadStatus::Uploading));
        assert_eq!(item.slot_value(Slot::Progress).as_deref(), Some("42%"));
        assert_eq!(item.slot_value(Slot::Speed).as_deref(), Some("512.0 B/s"));
        assert!(!item.is_terminal());
    }

    #[test]
    fn tolerates_numeric_ids_and_missing_fields() {
        let items = parse_poll_response(r#"[{"id":7,"status":"Done","total":1024}]"#)
            .unwrap()
            .unwrap();

        let item = &items[0];
        assert_eq!(item.id, ItemId::from("7"));
        assert!(item.is_terminal());
        assert_eq!(item.total.as_deref(), Some("1024"));
        assert_eq!(item.message, None);
        assert_eq!(item.slot_value(Slot::Progress), None);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status: UploadStatus = serde_json::from_str("\"Scanning\"").unwrap();
        assert_eq!(status, UploadStatus::Other("Scanning".into()));
        assert!(!status.is_terminal());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Scanning\"");
    }

    #[test]
    fn rejects_non_array_bodies() {
        assert!(parse_poll_response("{\"id\":1}").is_err());
        assert!(parse_poll_response("<html>").is_err());
    }
}
