//! Whole-table load cache.
//!
//! Tables are keyed by canonical path and worksheet and live until the
//! process exits. Loading has no side effects, so a cached table is
//! interchangeable with a fresh load.

use super::loader::{load_table, LoadOptions};
use super::DatasetError;
use crate::models::Table;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DatasetCache {
    tables: HashMap<(PathBuf, Option<String>), Arc<Table>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path, options: &LoadOptions) -> Result<Arc<Table>, DatasetError> {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let key = (canonical, options.sheet.clone());

        if let Some(table) = self.tables.get(&key) {
            debug!("Dataset cache hit: {}", key.0.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_table(path, options)?);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
