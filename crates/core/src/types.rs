/// Articles, versions and tags are keyed by prefixed string serials.
pub type Serial = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
