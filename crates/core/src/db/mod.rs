//! Pre-analyzed database access for the streaming (binary) conversion mode.
//!
//! The converter never walks a database's storage itself; it only needs the
//! small query surface described by [`AnalysisDatabase`]:
//! - the function list (address + name),
//! - the segment list and each segment's end,
//! - per-address comment lookup (repeatable or regular),
//! - the image base.
//!
//! Two implementations ship with the crate:
//! - [`SqliteDatabase`]: a SQLite file with a versioned schema.
//! - [`MemoryDatabase`]: an in-memory database, loadable from a JSON snapshot.

mod memory;
mod sqlite;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{CommentEntry, DatabaseSnapshot, MemoryDatabase, SegmentEntry};
pub use sqlite::{SqliteDatabase, CURRENT_SCHEMA_VERSION};

/// Error type for opening or enumerating an analysis database.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// The file opened fine but carries no analysis schema.
    #[error("Not an analysis database: {0}")]
    NotAnalysisDatabase(PathBuf),

    #[error("Database not found at {0}")]
    Missing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse database snapshot JSON: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// A single failed per-address query. Callers treat it as "nothing here".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no {what} at {address:#x}")]
    NotFound { what: &'static str, address: u64 },
    #[error("lookup failed: {0}")]
    Backend(String),
}

/// A function as listed by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub address: u64,
    pub name: String,
}

impl FunctionEntry {
    pub fn new(address: u64, name: impl Into<String>) -> Self {
        Self { address, name: name.into() }
    }
}

/// Query surface of an analyzed database.
pub trait AnalysisDatabase {
    /// All functions, in the database's own order.
    fn functions(&self) -> DbResult<Vec<FunctionEntry>>;

    /// Start address of every segment.
    fn segments(&self) -> DbResult<Vec<u64>>;

    /// End address (exclusive) of the segment starting at `start`.
    fn segment_end(&self, start: u64) -> Result<u64, LookupError>;

    /// Comment attached to `address`. `repeatable` selects the repeatable slot.
    fn comment(&self, address: u64, repeatable: bool) -> Result<String, LookupError>;

    fn image_base(&self) -> Result<u64, LookupError>;
}

/// Open the database at `path`, picking the reader from the file extension.
///
/// `.json` files are read as [`DatabaseSnapshot`]s; everything else is
/// handed to the SQLite reader.
pub fn open_database(path: &Path) -> DbResult<Box<dyn AnalysisDatabase>> {
    if !path.is_file() {
        return Err(DbError::Missing(path.to_path_buf()));
    }

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        log::debug!("opening {} as a JSON snapshot", path.display());
        return Ok(Box::new(MemoryDatabase::from_json_file(path)?));
    }

    log::debug!("opening {} as a SQLite analysis database", path.display());
    Ok(Box::new(SqliteDatabase::open(path)?))
}
