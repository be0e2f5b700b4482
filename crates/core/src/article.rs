//! Article and version domain types, plus create-request DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::VersionStatus;
use crate::tag::dedup_serials;
use crate::types::{Serial, Timestamp};

/// An article: a stable identity owning an ordered sequence of versions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub serial: Serial,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// One version of an article, with the serials of the tags it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Version {
    pub serial: Serial,
    pub article_serial: Serial,
    pub version_number: i32,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub status: VersionStatus,
    pub tag_serials: Vec<Serial>,
    pub tag_relationship_score: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

/// Insert payload for a new version. New versions always start as drafts.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub serial: Serial,
    pub article_serial: Serial,
    pub version_number: i32,
    pub author_username: String,
    pub title: String,
    pub content: String,
}

/// DTO for `POST /articles`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_serials: Vec<Serial>,
}

impl CreateArticle {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title_and_content(&self.title, &self.content)
    }

    /// Requested tag serials with duplicates removed, first occurrence wins.
    pub fn unique_tag_serials(&self) -> Vec<Serial> {
        dedup_serials(&self.tag_serials)
    }
}

/// DTO for `POST /articles/{serial}/versions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleVersion {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_serials: Vec<Serial>,
}

impl CreateArticleVersion {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title_and_content(&self.title, &self.content)
    }

    pub fn unique_tag_serials(&self) -> Vec<Serial> {
        dedup_serials(&self.tag_serials)
    }
}

/// Result of creating an article or a new article version.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedVersion {
    pub article_serial: Serial,
    pub author_username: String,
    pub version: Version,
}

fn validate_title_and_content(title: &str, content: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("title is mandatory".into()));
    }
    if content.trim().is_empty() {
        return Err(CoreError::Validation("content is mandatory".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn request(title: &str, content: &str) -> CreateArticle {
        CreateArticle {
            title: title.into(),
            content: content.into(),
            tag_serials: vec!["TAG2".into(), "TAG1".into(), "TAG2".into()],
        }
    }

    #[test]
    fn title_and_content_are_mandatory() {
        assert!(request("Title", "Body").validate().is_ok());
        assert_matches!(request("  ", "Body").validate(), Err(CoreError::Validation(m)) if m.contains("title"));
        assert_matches!(request("Title", "").validate(), Err(CoreError::Validation(m)) if m.contains("content"));
    }

    #[test]
    fn tag_serials_are_deduplicated_in_order() {
        assert_eq!(request("t", "c").unique_tag_serials(), vec!["TAG2", "TAG1"]);
    }

    #[test]
    fn missing_tag_serials_default_to_empty() {
        let req: CreateArticleVersion =
            serde_json::from_str(r#"{"title": "t", "content": "c"}"#).unwrap();
        assert!(req.tag_serials.is_empty());
    }
}
