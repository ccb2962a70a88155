use chrono::{DateTime, Utc};

use super::content::ContentElement;

/// A single page of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Page {
    pub title: String,
    pub elements: Vec<ContentElement>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub author: Option<String>,
    /// Page nesting level within the section (0 = top-level page).
    pub level: u32,
}

impl Page {
    pub fn new(title: impl Into<String>, elements: Vec<ContentElement>) -> Self {
        Self {
            title: title.into(),
            elements,
            created: None,
            modified: None,
            author: None,
            level: 0,
        }
    }
}
