//! Query history and bookmarks
//!
//! The store is one JSON file. Every mutation reads the whole file,
//! changes it and writes it back, so several sessions sharing the file
//! see each other's entries at the next mutation.

use std::path::{Path, PathBuf};

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ParseError, Result};

/// Default cap on history entries
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// A named saved query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub query: String,
}

/// Contents of the history file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHistory {
    /// Most recent first
    #[serde(default)]
    pub history: Vec<String>,

    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

/// Validate a query filter and return its compact form
///
/// Queries must be JSON objects; extended JSON such as `{"$oid": ...}`
/// is accepted.
pub fn normalize_query(query: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(query.trim()).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseError::NotADocument("a non-object query".to_string()).into());
    }
    Bson::try_from(value.clone()).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    Ok(value.to_string())
}

/// History/bookmark file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Cap the number of history entries (builder style)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file
    ///
    /// A missing or unreadable file yields empty history and bookmarks.
    pub fn load(&self) -> QueryHistory {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No history at {}: {}", self.path.display(), e);
                return QueryHistory::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(history) => history,
            Err(e) => {
                warn!("Ignoring unreadable history file {}: {}", self.path.display(), e);
                QueryHistory::default()
            }
        }
    }

    /// Rewrite the whole file
    pub fn save(&self, data: &QueryHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Move `query` to the front of the history
    ///
    /// Nothing is written when it is already the most recent entry.
    pub fn add_to_history(&self, query: &str) -> Result<()> {
        let query = normalize_query(query)?;
        let mut data = self.load();
        if data.history.first() == Some(&query) {
            return Ok(());
        }
        data.history.retain(|q| q != &query);
        data.history.insert(0, query);
        data.history.truncate(self.max_entries);
        self.save(&data)
    }

    /// Append a named bookmark
    pub fn add_bookmark(&self, name: &str, query: &str) -> Result<()> {
        let query = normalize_query(query)?;
        let mut data = self.load();
        data.bookmarks.push(Bookmark {
            name: name.to_string(),
            query,
        });
        self.save(&data)
    }

    /// Empty the history, keeping bookmarks
    pub fn clear_history(&self) -> Result<()> {
        let mut data = self.load();
        data.history.clear();
        self.save(&data)
    }
}
