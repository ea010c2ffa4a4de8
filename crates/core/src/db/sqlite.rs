use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::db::{AnalysisDatabase, DbError, DbResult, FunctionEntry, LookupError};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

const IMAGE_BASE_KEY: &str = "image_base";

/// SQLite-backed analysis database.
///
/// Addresses are stored as SQLite integers (reinterpreted as `i64`).
/// Conversion opens the file read-only via [`SqliteDatabase::open`]; fixtures and
/// exporters build one with [`SqliteDatabase::create`] and the insert helpers.
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open an existing analysis database read-only.
    pub fn open(path: &Path) -> DbResult<Self> {
        if !path.is_file() {
            return Err(DbError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        match current_schema_version(&conn)? {
            0 => Err(DbError::NotAnalysisDatabase(path.to_path_buf())),
            found if found > CURRENT_SCHEMA_VERSION => Err(DbError::UnsupportedSchemaVersion {
                found,
                min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
                max_supported: CURRENT_SCHEMA_VERSION,
            }),
            _ => Ok(Self { conn }),
        }
    }

    /// Open (or create) a writable database at `path` and ensure the schema exists.
    pub fn create(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn insert_function(&self, entry: &FunctionEntry) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO functions (address, name) VALUES (?1, ?2)",
            params![entry.address as i64, entry.name],
        )?;
        Ok(())
    }

    pub fn insert_segment(&self, start: u64, end: u64, name: Option<&str>) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO segments (start, end, name) VALUES (?1, ?2, ?3)",
            params![start as i64, end as i64, name],
        )?;
        Ok(())
    }

    pub fn insert_comment(&self, address: u64, repeatable: bool, text: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO comments (address, repeatable, text)
            VALUES (?1, ?2, ?3)
            "#,
            params![address as i64, repeatable, text],
        )?;
        Ok(())
    }

    pub fn set_image_base(&self, image_base: u64) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![IMAGE_BASE_KEY, image_base as i64],
        )?;
        Ok(())
    }
}

impl AnalysisDatabase for SqliteDatabase {
    fn functions(&self) -> DbResult<Vec<FunctionEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT address, name
            FROM functions
            ORDER BY address
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let address: i64 = row.get(0)?;
            Ok(FunctionEntry { address: address as u64, name: row.get(1)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn segments(&self) -> DbResult<Vec<u64>> {
        let mut stmt = self.conn.prepare("SELECT start FROM segments ORDER BY start")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row? as u64);
        }
        Ok(out)
    }

    fn segment_end(&self, start: u64) -> Result<u64, LookupError> {
        let end: Option<i64> = self
            .conn
            .query_row("SELECT end FROM segments WHERE start = ?1", params![start as i64], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| LookupError::Backend(e.to_string()))?;
        end.map(|e| e as u64).ok_or(LookupError::NotFound { what: "segment", address: start })
    }

    fn comment(&self, address: u64, repeatable: bool) -> Result<String, LookupError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT text FROM comments WHERE address = ?1 AND repeatable = ?2")
            .map_err(|e| LookupError::Backend(e.to_string()))?;
        let text: Option<String> = stmt
            .query_row(params![address as i64, repeatable], |row| row.get(0))
            .optional()
            .map_err(|e| LookupError::Backend(e.to_string()))?;
        text.ok_or(LookupError::NotFound { what: "comment", address })
    }

    fn image_base(&self) -> Result<u64, LookupError> {
        let base: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![IMAGE_BASE_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| LookupError::Backend(e.to_string()))?;
        base.map(|b| b as u64).ok_or(LookupError::NotFound { what: "image base", address: 0 })
    }
}

fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS functions (
                address INTEGER PRIMARY KEY,
                name    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS segments (
                start INTEGER PRIMARY KEY,
                end   INTEGER NOT NULL,
                name  TEXT
            );

            CREATE TABLE IF NOT EXISTS comments (
                address    INTEGER NOT NULL,
                repeatable INTEGER NOT NULL,
                text       TEXT NOT NULL,
                PRIMARY KEY (address, repeatable)
            );

            CREATE TABLE IF NOT EXISTS metadata (
                key   TEXT PRIMARY KEY,
                value
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}
