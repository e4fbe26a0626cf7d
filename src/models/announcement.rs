//! Announcement data structure.

use serde::{Deserialize, Serialize};

/// An announcement scraped from the source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Identifier derived from title and date
    id: String,

    /// Announcement title
    title: String,

    /// Date text as published, unparsed
    date: String,

    /// Paragraph texts of the body, in page order
    content_preview: Vec<String>,
}

impl Announcement {
    /// Create an announcement, deriving its identifier.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        content_preview: Vec<String>,
    ) -> Self {
        let title = title.into();
        let date = date.into();
        Self {
            id: Self::derive_id(&title, &date),
            title,
            date,
            content_preview,
        }
    }

    /// Identifier used for deduplication.
    ///
    /// Any rewording of the title or date on the site yields a new identifier.
    pub fn derive_id(title: &str, date: &str) -> String {
        format!("{}_{}", title, date)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn content_preview(&self) -> &[String] {
        &self.content_preview
    }
}
