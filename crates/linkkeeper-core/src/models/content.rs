//! Saved links and the tags attached to them.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of resource a saved link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Video,
    Article,
    Audio,
    Document,
    Tweet,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Image,
        ContentKind::Video,
        ContentKind::Article,
        ContentKind::Audio,
        ContentKind::Document,
        ContentKind::Tweet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Article => "article",
            ContentKind::Audio => "audio",
            ContentKind::Document => "document",
            ContentKind::Tweet => "tweet",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ContentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("unknown content type '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Tag {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Content {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Content {
    pub fn tag_titles(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Payload for saving a new link.
#[derive(Debug, Clone, Serialize)]
pub struct NewContent {
    pub link: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

/// Filters for content search. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct ContentSearch {
    pub tag_ids: Vec<String>,
    pub before_date: Option<NaiveDate>,
}

impl ContentSearch {
    /// Query pairs in the form the search endpoint expects.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.tag_ids.is_empty() {
            pairs.push(("tagIds".to_string(), self.tag_ids.join(",")));
        }
        if let Some(date) = self.before_date {
            pairs.push(("beforeDate".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// Unique tags across a collection, in first-seen order.
pub fn collect_tags(contents: &[Content]) -> Vec<Tag> {
    let mut seen = HashSet::new();
    contents
        .iter()
        .flat_map(|c| c.tags.iter())
        .filter(|t| seen.insert(t.id.as_str()))
        .cloned()
        .collect()
}
