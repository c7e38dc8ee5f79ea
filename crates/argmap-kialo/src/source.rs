//! Source documents, their URLs, and the topics-file convention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::SourceName;

pub const KIALO_BASE_URL: &str = "https://www.kialo.com/";

/// Placeholder stored in `Source::text`; the export itself is not embedded.
pub const SOURCE_TEXT: &str = "Full Kialo Text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: SourceName,
    pub topic: String,
    pub text: String,
    pub url: String,
}

impl Source {
    pub fn new(name: SourceName, topic: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name,
            topic: topic.into(),
            text: SOURCE_TEXT.to_string(),
            url: url.into(),
        }
    }
}

/// Source name → URL, built once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTable(BTreeMap<SourceName, String>);

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: SourceName, url: impl Into<String>) {
        self.0.insert(name, url.into());
    }

    pub fn url(&self, name: &SourceName) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SourceName, String)> for SourceTable {
    fn from_iter<T: IntoIterator<Item = (SourceName, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The discussion slug of a Kialo URL: everything after the site prefix, or
/// the whole string for URLs on another host.
pub fn url_slug(url: &str) -> &str {
    url.rsplit(KIALO_BASE_URL).next().unwrap_or(url)
}

/// `(<slug>.txt, <slug>.json)`: export file to read and JSON file to write.
pub fn url_to_filenames(url: &str) -> (String, String) {
    let slug = url_slug(url);
    (format!("{slug}.txt"), format!("{slug}.json"))
}

/// Inverse of [`url_slug`] for exports found on disk without a topics file.
pub fn slug_to_url(slug: &str) -> String {
    format!("{KIALO_BASE_URL}{slug}")
}

/// URLs listed in a topics file: lines starting with `http`, trimmed.
pub fn read_topics(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| line.starts_with("http"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
