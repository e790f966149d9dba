//! ## Load-once Table Cache
//!
//! Reading the trip parts is by far the most expensive step of a refresh, so loaded tables are
//! memoised by the path they were read from. [`TableCache`] is an explicit map owned by the
//! dashboard session; entries live until [`TableCache::invalidate`] or [`TableCache::clear`]
//! is called.

use crate::exceptions::DashboardResult;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::{DataFrame, SessionContext};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file that was skipped during a load, with the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files_read: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub rows: usize,
}

/// A fully materialised table together with the report of how it was loaded.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    report: LoadReport,
}

impl LoadedTable {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>, report: LoadReport) -> Self {
        Self {
            schema,
            batches,
            report,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    /// Exposes the table to `ctx` as a single-partition in-memory DataFrame.
    pub fn to_dataframe(&self, ctx: &SessionContext) -> DashboardResult<DataFrame> {
        let mem_table = MemTable::try_new(self.schema.clone(), vec![self.batches.clone()])?;
        Ok(ctx.read_table(Arc::new(mem_table))?)
    }
}

/// Path-keyed memoisation of loaded tables.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, Arc<LoadedTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<LoadedTable>> {
        self.entries.get(path).cloned()
    }

    /// Stores `table` under `path`, replacing any previous entry, and returns the shared handle.
    pub fn insert(&mut self, path: impl Into<PathBuf>, table: LoadedTable) -> Arc<LoadedTable> {
        let table = Arc::new(table);
        self.entries.insert(path.into(), table.clone());
        table
    }

    /// Drops the entry for `path`. Returns true if there was one.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
