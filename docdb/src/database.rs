//! The top-level handle: owns the KV engine, the open-table registry, and
//! (through the catalog) the index metadata.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use docdb_kv::EnvOptions;
use docdb_kv::KeyRange;
use docdb_kv::KvEngine;
use docdb_kv::ReadOperations;
use docdb_kv::Transaction;
use docdb_kv::WriteOperations;

use crate::catalog::CATALOG_TABLE;
use crate::error::Error;
use crate::error::Result;
use crate::table::Table;

/// A scoped writer transaction spanning multiple `Table` operations, all of
/// which commit or abort together. Table methods with a `_with` suffix
/// (e.g. `Table::append_with`) accept [`ActiveTransaction::raw`] in place of
/// opening their own transaction.
pub struct ActiveTransaction<E: KvEngine> {
    tx: E::WriteTxn,
}

impl<E: KvEngine> ActiveTransaction<E> {
    /// Borrow the underlying writer transaction to pass to a `Table`'s
    /// `_with` methods.
    pub fn raw(&self) -> &E::WriteTxn {
        &self.tx
    }

    /// Commit every operation performed through this transaction.
    pub fn commit(self) -> Result<()> {
        self.tx.commit().map_err(Error::WriteFail)
    }
}

/// Owns the KV environment and every open [`Table`].
pub struct Database<E: KvEngine> {
    kv: Arc<E>,
    tables: HashMap<String, Table<E>>,
}

impl<E: KvEngine> Database<E> {
    /// Open a Database backed by a file-based environment at `path`.
    pub fn open(path: &Path, options: &EnvOptions) -> Result<Self> {
        let kv = E::open(path, options).map_err(Error::WriteFail)?;
        log::info!("database opened at {}", path.display());
        Ok(Self {
            kv: Arc::new(kv),
            tables: HashMap::new(),
        })
    }

    /// Open an in-memory Database, primarily for tests.
    pub fn open_in_memory() -> Result<Self> {
        let kv = E::in_memory(None).map_err(Error::WriteFail)?;
        Ok(Self {
            kv: Arc::new(kv),
            tables: HashMap::new(),
        })
    }

    /// Flush and release the environment. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.kv.close().map_err(Error::WriteFail)
    }

    /// Re-derive a `Database` handle over the same environment with an
    /// empty table registry, forcing every subsequent `table()` call to
    /// rehydrate its indexes from the catalog rather than from an
    /// in-memory `Table` this process already had open. Used to exercise
    /// persistence-across-reopen without requiring a file-backed
    /// environment in tests.
    pub fn reopen(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            tables: HashMap::new(),
        }
    }

    /// Return the cached `Table` handle for `name`, opening (and implicitly
    /// creating, on first write) it if this is the first access.
    pub fn table(&mut self, name: &str) -> Result<&Table<E>> {
        if !self.tables.contains_key(name) {
            let table = Table::open(self.kv.clone(), name)?;
            self.tables.insert(name.to_string(), table);
        }
        Ok(self.tables.get(name).expect("just inserted"))
    }

    /// Like [`Database::table`], but returns a mutable handle for
    /// operations that add or remove indexes (`Table::index`,
    /// `Table::unindex`, `Table::drop_index`).
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table<E>> {
        if !self.tables.contains_key(name) {
            let table = Table::open(self.kv.clone(), name)?;
            self.tables.insert(name.to_string(), table);
        }
        Ok(self.tables.get_mut(name).expect("just inserted"))
    }

    /// Enumerate every primary table name known to the environment (i.e.
    /// excluding index tables `_<table>_<index>` and the catalog table).
    pub fn tables(&self) -> Result<Vec<String>> {
        let mut names = self.kv.table_names().map_err(Error::WriteFail)?;
        names.retain(|name| name != CATALOG_TABLE && !name.starts_with('_'));
        names.sort();
        Ok(names)
    }

    /// Whether a primary table named `name` currently exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.tables()?.contains(&name.to_string()))
    }

    /// Drop a table entirely: every index (catalog entry + backing table),
    /// then the primary table, then remove it from the registry. A
    /// subsequent `table(name)` recreates an empty table with no indexes.
    pub fn drop(&mut self, name: &str) -> Result<()> {
        if !self.exists(name)? {
            return Err(Error::TableMissing(name.to_string()));
        }
        self.table(name)?;
        if let Some(table) = self.tables.get(name) {
            table.drop_all()?;
        }
        self.tables.remove(name);
        Ok(())
    }

    /// Rebuild a table's primary storage in primary-key order, restoring
    /// the append-optimized write path after deletes have broken strict key
    /// monotonicity.
    pub fn restructure(&mut self, name: &str) -> Result<()> {
        self.table(name)?;
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        let entries = tx.range(name, &KeyRange::all()).map_err(Error::WriteFail)?;
        tx.clear(name).map_err(Error::WriteFail)?;
        for (pk, value) in &entries {
            tx.insert_append(name, pk, value).map_err(Error::WriteFail)?;
        }
        tx.commit().map_err(Error::WriteFail)?;
        log::info!("table \"{name}\": restructured ({} records)", entries.len());
        Ok(())
    }

    /// Begin a scoped writer transaction spanning multiple table
    /// operations.
    pub fn begin(&self) -> Result<ActiveTransaction<E>> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        Ok(ActiveTransaction { tx })
    }
}
