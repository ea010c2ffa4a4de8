use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::{AnalysisDatabase, DbError, DbResult, FunctionEntry, LookupError};

/// Serializable dump of an analysis database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base: Option<u64>,
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
    #[serde(default)]
    pub segments: Vec<SegmentEntry>,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub address: u64,
    pub text: String,
    #[serde(default)]
    pub repeatable: bool,
}

/// Analysis database held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    image_base: Option<u64>,
    functions: Vec<FunctionEntry>,
    segments: BTreeMap<u64, u64>,
    comments: HashMap<(u64, bool), String>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON [`DatabaseSnapshot`] from disk.
    pub fn from_json_file(path: &Path) -> DbResult<Self> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| DbError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&body)
    }

    pub fn from_json(body: &str) -> DbResult<Self> {
        let snapshot: DatabaseSnapshot = serde_json::from_str(body)?;
        Ok(Self::from(snapshot))
    }

    pub fn with_image_base(mut self, image_base: u64) -> Self {
        self.image_base = Some(image_base);
        self
    }

    pub fn with_function(mut self, address: u64, name: impl Into<String>) -> Self {
        self.functions.push(FunctionEntry::new(address, name));
        self
    }

    pub fn with_segment(mut self, start: u64, end: u64) -> Self {
        self.segments.insert(start, end);
        self
    }

    pub fn with_comment(mut self, address: u64, repeatable: bool, text: impl Into<String>) -> Self {
        self.comments.insert((address, repeatable), text.into());
        self
    }
}

impl From<DatabaseSnapshot> for MemoryDatabase {
    fn from(snapshot: DatabaseSnapshot) -> Self {
        Self {
            image_base: snapshot.image_base,
            functions: snapshot.functions,
            segments: snapshot.segments.into_iter().map(|s| (s.start, s.end)).collect(),
            comments: snapshot
                .comments
                .into_iter()
                .map(|c| ((c.address, c.repeatable), c.text))
                .collect(),
        }
    }
}

impl AnalysisDatabase for MemoryDatabase {
    fn functions(&self) -> DbResult<Vec<FunctionEntry>> {
        Ok(self.functions.clone())
    }

    fn segments(&self) -> DbResult<Vec<u64>> {
        Ok(self.segments.keys().copied().collect())
    }

    fn segment_end(&self, start: u64) -> Result<u64, LookupError> {
        self.segments
            .get(&start)
            .copied()
            .ok_or(LookupError::NotFound { what: "segment", address: start })
    }

    fn comment(&self, address: u64, repeatable: bool) -> Result<String, LookupError> {
        self.comments
            .get(&(address, repeatable))
            .cloned()
            .ok_or(LookupError::NotFound { what: "comment", address })
    }

    fn image_base(&self) -> Result<u64, LookupError> {
        self.image_base.ok_or(LookupError::NotFound { what: "image base", address: 0 })
    }
}
