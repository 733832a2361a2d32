//! Shared types passed between pipeline stages.
//!
//! [`Document`] is produced by [`scan`](crate::scan) (or built directly by
//! library users) and consumed read-only by [`render`](crate::render).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single authored post.
///
/// Identified by `slug`, which must be unique across the documents of one
/// render. The body is raw markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// URL path segment, e.g. `hello-world` → `/hello-world/`.
    pub slug: String,
    pub title: String,
    /// Publish date, used for display and feed ordering.
    pub date: NaiveDate,
    /// Raw markdown body.
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary for listings and the feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Document {
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
        body: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            date,
            body: body.into(),
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
