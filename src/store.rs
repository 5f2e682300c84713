//! JSON-file record store.
//!
//! A [`Store`] keeps named tables of schema-less records in memory and mirrors
//! them to a single JSON document:
//!
//! ```json
//! { "users": [ { "id": "…", "name": "Ana", "email": "ana@x.com" } ] }
//! ```
//!
//! The document is read once by [`Store::open`] and rewritten in full after
//! every successful mutation. Nothing is batched and nothing is rolled back:
//! if the write fails, the in-memory change stays and the caller gets the
//! error.
//!
//! # Concurrency
//!
//! Each mutation changes memory under a short synchronous lock. Writes to disk
//! are serialized by a separate async lock: the writer takes its snapshot only
//! once it holds that lock, writes it to a sibling `*.tmp` file and renames it
//! over the document. The file is therefore always one complete snapshot, and
//! the last write to finish carries the newest state.
//!
//! Operations are still not transactional. A handler that reads with
//! [`Store::select`] and then mutates can lose a concurrent update made in
//! between.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::Error;

/// One row: field name to JSON value.
pub type Record = Map<String, Value>;

/// Field name to case-insensitive substring. A record matches when any field
/// matches.
pub type Filter = HashMap<String, String>;

type Tables = BTreeMap<String, Vec<Record>>;

/// Named tables of records, mirrored to one JSON file.
///
/// Open it once with [`Store::open`] and share it behind an `Arc`.
pub struct Store {
    path: PathBuf,
    tables: Mutex<Tables>,
    writer: tokio::sync::Mutex<()>,
}

impl Store {
    /// Loads the store from `path`.
    ///
    /// A missing, unreadable or malformed file is not an error: the store
    /// starts empty and an empty document is written straight away. If that
    /// write also fails it is logged and the store still opens; the next
    /// mutation will try again.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let loaded = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Tables>(&bytes)
                .map_err(|e| warn!(path = %path.display(), "store file is malformed, starting empty: {e}"))
                .ok(),
            Err(e) => {
                warn!(path = %path.display(), "store file unavailable, starting empty: {e}");
                None
            }
        };

        let fresh = loaded.is_none();
        let store = Self {
            path,
            tables: Mutex::new(loaded.unwrap_or_default()),
            writer: tokio::sync::Mutex::new(()),
        };

        if fresh {
            if let Err(e) = store.persist().await {
                warn!(path = %store.path.display(), "could not create store file: {e}");
            }
        } else {
            let tables = store.lock();
            info!(
                path = %store.path.display(),
                tables = tables.len(),
                records = tables.values().map(Vec::len).sum::<usize>(),
                "store loaded"
            );
        }

        store
    }

    /// Returns the records of `table` in insertion order, or only those
    /// matching `filter`.
    ///
    /// A record matches a filter when at least one listed field contains its
    /// needle, ignoring case. Fields the record does not have never match.
    /// String values are compared as-is; numbers and booleans by their JSON
    /// text; other values never match. An empty filter matches nothing.
    pub fn select(&self, table: &str, filter: Option<&Filter>) -> Vec<Record> {
        let tables = self.lock();
        let Some(rows) = tables.get(table) else {
            return Vec::new();
        };

        match filter {
            None => rows.clone(),
            Some(filter) => {
                let needles: Vec<(&str, String)> = filter.iter()
                    .map(|(field, needle)| (field.as_str(), needle.to_lowercase()))
                    .collect();
                rows.iter()
                    .filter(|row| needles.iter().any(|(field, needle)| contains(row, field, needle)))
                    .cloned()
                    .collect()
            }
        }
    }

    /// Appends `record` to `table`, creating the table if needed.
    pub async fn insert(&self, table: &str, record: Record) -> Result<Record, Error> {
        self.lock().entry(table.to_owned()).or_default().push(record.clone());
        self.persist().await?;
        Ok(record)
    }

    /// Replaces the record whose `id` equals `id` with `{id, ...fields}`.
    ///
    /// This is a full replace: fields of the old record that are not in
    /// `fields` are gone afterwards. An `id` inside `fields` is ignored.
    /// Unknown tables and ids are a silent no-op.
    pub async fn update(&self, table: &str, id: &str, fields: Record) -> Result<(), Error> {
        {
            let mut tables = self.lock();
            let Some(row) = tables.get_mut(table).and_then(|rows| rows.iter_mut().find(|r| has_id(r, id))) else {
                return Ok(());
            };

            let mut replacement = Record::new();
            replacement.insert("id".to_owned(), Value::String(id.to_owned()));
            replacement.extend(fields.into_iter().filter(|(k, _)| k != "id"));
            *row = replacement;
        }
        self.persist().await
    }

    /// Removes the record whose `id` equals `id`. Unknown tables and ids are a
    /// silent no-op, so deleting twice is the same as deleting once.
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        {
            let mut tables = self.lock();
            let Some(rows) = tables.get_mut(table) else {
                return Ok(());
            };
            let Some(index) = rows.iter().position(|r| has_id(r, id)) else {
                return Ok(());
            };
            rows.remove(index);
        }
        self.persist().await
    }

    /// Serializes every table and atomically replaces the store file.
    async fn persist(&self) -> Result<(), Error> {
        let _writer = self.writer.lock().await;

        let snapshot = serde_json::to_vec(&*self.lock()).map_err(Error::Encode)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &snapshot).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = snapshot.len(), "store persisted");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `db.json` → `db.json.tmp`, next to the document so the rename stays on
/// one filesystem.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("id").and_then(Value::as_str) == Some(id)
}

/// `needle` must already be lowercase.
fn contains(record: &Record, field: &str, needle: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s.to_lowercase().contains(needle),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string().to_lowercase().contains(needle),
        _ => false,
    }
}
