use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A celebration guests can RSVP to (e.g. the engagement party or the wedding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    /// URL-safe identifier, e.g. `"wedding"`
    pub slug: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

/// RSVP payload as the backend expects it on `POST /rsvp`.
///
/// The client never validates it; name and slug rules are enforced server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRsvp {
    pub event_slug: String,
    pub name: String,
    pub email: String,
    pub attending: bool,
}

/// Stored RSVP returned after a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attending: bool,
    pub submitted_at: NaiveDateTime,
    pub event: Event,
}

/// Flattened RSVP row from the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpListEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attending: bool,
    pub submitted_at: NaiveDateTime,
    pub event_name: String,
    pub event_slug: String,
}

impl RsvpListEntry {
    pub fn attending_label(&self) -> &'static str {
        if self.attending { "Yes" } else { "No" }
    }
}

/// Per-event response counts for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub event_slug: String,
    pub event_name: String,
    pub total_responses: u64,
    pub attending: u64,
    pub not_attending: u64,
}

/// Where the couple's gift registry lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub registry_url: String,
}

/// Bearer credential issued by `POST /admin/login`.
///
/// Accepts both `{"access_token": ...}` and the shorter `{"token": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Downloaded RSVP export (CSV as produced by the backend).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    /// Filename suggested by the `Content-Disposition` header
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Filename to save under: the server's suggestion, else `rsvps_<slug>.csv`
    /// or `rsvps_all.csv`.
    pub fn filename_or_default(&self, event_slug: Option<&str>) -> String {
        if let Some(name) = self.filename.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        default_export_filename(event_slug)
    }
}

/// Backend naming scheme for exports.
pub fn default_export_filename(event_slug: Option<&str>) -> String {
    match event_slug.filter(|s| !s.is_empty()) {
        Some(slug) => format!("rsvps_{slug}.csv"),
        None => "rsvps_all.csv".to_string(),
    }
}
