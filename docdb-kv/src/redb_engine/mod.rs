mod read_tx;
mod write_tx;

pub use read_tx::RedbReadTxn;
pub use write_tx::RedbWriteTxn;

use std::path::Path;

use anyhow::Result;
use redb::Database;
use redb::TableDefinition;
use redb::TableHandle;

use crate::EnvOptions;
use crate::KvEngine;

pub(crate) fn tabledef(name: &str) -> TableDefinition<'_, &'static [u8], &'static [u8]> {
    TableDefinition::new(name)
}

pub(crate) fn multimap_tabledef(
    name: &str,
) -> redb::MultimapTableDefinition<'_, &'static [u8], &'static [u8]> {
    redb::MultimapTableDefinition::new(name)
}

/// `redb`-backed implementation of [`KvEngine`]. `redb` is a pure-Rust,
/// single-file, memory-mapped copy-on-write B+tree store with the same
/// "one writer, many readers" transaction model as LMDB, which is what
/// makes it a faithful stand-in for the engine this crate was designed
/// against.
pub struct RedbEngine {
    db: Database,
    /// Mirrors `EnvOptions::sync`; applied to every write transaction since
    /// `redb` has no environment-wide durability setting, only a per-write
    /// one (`WriteTransaction::set_durability`).
    sync: bool,
}

impl KvEngine for RedbEngine {
    type ReadTxn = RedbReadTxn;
    type WriteTxn = RedbWriteTxn;

    fn open(path: &Path, options: &EnvOptions) -> Result<Self> {
        let db = Database::create(path)?;
        Ok(Self { db, sync: options.sync })
    }

    fn in_memory(bytes: Option<&[u8]>) -> Result<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        if let Some(bytes) = bytes {
            backend.write(0, bytes)?;
        }
        let db = Database::builder().create_with_backend(backend)?;
        Ok(Self { db, sync: true })
    }

    fn read_tx(&self) -> Result<Self::ReadTxn> {
        Ok(RedbReadTxn::new(self.db.begin_read()?))
    }

    fn write_tx(&self) -> Result<Self::WriteTxn> {
        let mut write = self.db.begin_write()?;
        write.set_durability(if self.sync {
            redb::Durability::Immediate
        } else {
            redb::Durability::Eventual
        });
        Ok(RedbWriteTxn::new(write))
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let read = self.db.begin_read()?;
        let mut names = read
            .list_tables()?
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>();
        names.extend(read.list_multimap_tables()?.map(|t| t.name().to_string()));
        Ok(names)
    }

    fn close(&self) -> Result<()> {
        // `redb::Database` flushes and releases its file mapping on drop;
        // there is no separate handle to release early, so this is a no-op
        // kept for interface parity with `Database::close` in docdb.
        Ok(())
    }
}
