//! Ordered key/value engine abstraction used by `docdb`.
//!
//! A `KvEngine` exposes named tables, a single writer transaction at a time,
//! unlimited concurrent reader snapshots, and duplicate-key ("multimap")
//! tables whose values are kept sorted per key. The `redb` backend is the
//! only implementation shipped here, but callers interact only through the
//! traits below so another ordered mmap engine could be swapped in later.

#[cfg(feature = "redb")]
mod redb_engine;

#[cfg(feature = "redb")]
pub use redb_engine::RedbEngine;

#[cfg(test)]
mod test;

use std::ops::Bound;
use std::path::Path;

use anyhow::Result;

/// A range over byte-string keys. `std::ops::RangeBounds` can't be used
/// directly as a trait object / stored value, so operations accept this
/// concrete pair of bounds instead.
#[derive(Debug, Clone)]
pub struct KeyRange {
    pub start: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    pub fn all() -> Self {
        Self { start: Bound::Unbounded, end: Bound::Unbounded }
    }

    pub fn from_bounds(start: Bound<Vec<u8>>, end: Bound<Vec<u8>>) -> Self {
        Self { start, end }
    }

    /// `true` if `key` lies within this range.
    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Unbounded => true,
            Bound::Included(b) => key >= b.as_slice(),
            Bound::Excluded(b) => key > b.as_slice(),
        };
        let before_end = match &self.end {
            Bound::Unbounded => true,
            Bound::Included(b) => key <= b.as_slice(),
            Bound::Excluded(b) => key < b.as_slice(),
        };
        after_start && before_end
    }
}

/// Environment configuration, mirroring LMDB-style open flags. Not every
/// flag maps onto something `redb` can honor; see `DESIGN.md` for which
/// ones are no-ops on this backend.
#[derive(Debug, Clone)]
pub struct EnvOptions {
    /// Initial size hint for the backing map, in bytes. `redb` grows its
    /// file on demand, so this is only used to pre-size the backend when
    /// that's cheap to do; it is not a hard cap.
    pub map_size: u64,
    /// Kept for interface compatibility with LMDB-style environment flags.
    /// `redb` always stores its data in a single file, so this has no
    /// effect here.
    pub subdir: bool,
    /// Whether metadata pages are flushed synchronously on commit. `redb`
    /// does not expose a separate metadata-sync knob from its main
    /// durability setting, so this is retained as a no-op; `sync` below
    /// governs durability for both data and metadata.
    pub metasync: bool,
    /// Maps to `redb::Durability::Eventual` when `false`, and
    /// `redb::Durability::Immediate` when `true`.
    pub sync: bool,
    /// Kept for interface compatibility; `redb` has no fixed upper bound on
    /// the number of open tables.
    pub max_dbs: u32,
    /// Whether the backing file is memory-mapped for writes. `redb` always
    /// memory-maps its file regardless of this flag, so it is retained as a
    /// no-op rather than a real switch.
    pub writemap: bool,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            map_size: 2 * 1024 * 1024 * 1024,
            subdir: true,
            metasync: true,
            sync: true,
            max_dbs: 256,
            writemap: false,
        }
    }
}

/// Read-only operations available on both a read transaction and a write
/// transaction (a writer can always read back its own uncommitted writes).
pub trait ReadOperations {
    /// Fetch the value stored for `key` in `table`, if any.
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;
    /// Number of entries in `table`. Zero for a table that doesn't exist yet.
    fn count(&self, table: &str) -> Result<u64>;
    /// Ascending iteration over `table` restricted to `range`, buffered into
    /// a vector (see `docdb`'s `Table::find`/`range` for why this engine
    /// does not attempt to hand back a cursor borrowing the transaction).
    fn range(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    /// Same as `range`, but over a duplicate-key table: every `(key, value)`
    /// pair is yielded individually, in key order and then value order.
    fn range_multimap(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    /// All values stored for `key` in a duplicate-key table, in sorted order.
    fn get_multimap(&self, table: &str, key: &[u8]) -> Result<Vec<Vec<u8>>>;
    /// Number of `(key, value)` pairs in a duplicate-key table.
    fn count_multimap(&self, table: &str) -> Result<u64>;
    /// Names of every table (plain or multimap) currently present.
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Mutating operations, only available on a write transaction.
pub trait WriteOperations: ReadOperations {
    /// Insert `value` for `key`, returning the previous value if present.
    fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>>;
    /// Insert `value` for `key` using the engine's append-optimized path.
    /// Callers MUST supply strictly increasing keys; violating that is not
    /// memory-unsafe but forfeits the optimization (and, on some engines,
    /// errors outright).
    fn insert_append(&self, table: &str, key: &[u8], value: &[u8]) -> Result<()>;
    /// Remove `key`, returning its prior value if present.
    fn remove(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;
    /// Delete the table and its contents entirely.
    fn delete_table(&self, table: &str) -> Result<()>;
    /// Remove every entry from `table`, keeping the (now empty) table.
    fn clear(&self, table: &str) -> Result<()>;

    /// Insert `(key, value)` into a duplicate-key table.
    fn insert_multimap(&self, table: &str, key: &[u8], value: &[u8]) -> Result<()>;
    /// Remove one `(key, value)` pair from a duplicate-key table. Returns
    /// `true` if the pair was present.
    fn remove_multimap(&self, table: &str, key: &[u8], value: &[u8]) -> Result<bool>;
    /// Remove every value associated with `key` in a duplicate-key table.
    fn remove_all_multimap(&self, table: &str, key: &[u8]) -> Result<()>;
    /// Delete a duplicate-key table and its contents entirely.
    fn delete_multimap_table(&self, table: &str) -> Result<()>;
    /// Remove every entry from a duplicate-key table, keeping it around.
    fn clear_multimap(&self, table: &str) -> Result<()>;
}

/// A transaction that can be finalized. Dropping it without calling
/// `commit` aborts it (for a write transaction) or simply releases the
/// reader snapshot (for a read transaction).
pub trait Transaction {
    fn commit(self) -> Result<()>;
}

/// A read-only transaction: a consistent snapshot of every table.
pub trait ReadTransaction: ReadOperations + Transaction {}
impl<T: ReadOperations + Transaction> ReadTransaction for T {}

/// A write transaction: the single active writer, serialized by the engine.
pub trait WriteTransaction: WriteOperations + Transaction {}
impl<T: WriteOperations + Transaction> WriteTransaction for T {}

/// A generic ordered KV engine.
pub trait KvEngine: Sized {
    type ReadTxn: ReadTransaction;
    type WriteTxn: WriteTransaction;

    /// Open (creating if necessary) an environment persisted at `path`.
    fn open(path: &Path, options: &EnvOptions) -> Result<Self>;
    /// Construct an in-memory environment, optionally seeded from a prior
    /// byte-for-byte dump. Used by `docdb`'s test suite.
    fn in_memory(bytes: Option<&[u8]>) -> Result<Self>;

    fn read_tx(&self) -> Result<Self::ReadTxn>;
    fn write_tx(&self) -> Result<Self::WriteTxn>;

    /// Names of every table currently present, read via their own snapshot.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Flush and release the environment. Idempotent.
    fn close(&self) -> Result<()>;
}
