use serde::{Deserialize, Serialize};

use super::Content;

/// Whether the user's collection is published, and under which hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ShareStatus {
    #[serde(default)]
    pub share: bool,
    #[serde(default)]
    pub hash: Option<String>,
}

impl ShareStatus {
    /// Public link for the collection, if sharing is enabled.
    pub fn link(&self, base: &str) -> Option<String> {
        if !self.share {
            return None;
        }
        self.hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .map(|h| format!("{}/{}", base.trim_end_matches('/'), h))
    }
}

/// A collection published by another user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SharedCollection {
    pub username: String,
    #[serde(default)]
    pub content: Vec<Content>,
}
