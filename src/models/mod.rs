use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User metadata key holding the display filename.
pub const META_FILENAME: &str = "filename";
/// User metadata key holding the creation timestamp.
pub const META_CREATED_AT: &str = "createdat";
/// User metadata key holding the last update timestamp.
pub const META_UPDATED_AT: &str = "updatedat";

/// A stored blob as seen through its object metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FileRecord {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
