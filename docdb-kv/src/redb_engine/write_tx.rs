use std::ops::Bound;

use anyhow::Result;
use redb::ReadableMultimapTable;
use redb::ReadableTable;
use redb::TableError;

use crate::KeyRange;
use crate::ReadOperations;
use crate::Transaction;
use crate::WriteOperations;

use super::multimap_tabledef;
use super::tabledef;

fn bound_as_ref(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
    }
}

pub struct RedbWriteTxn {
    write: redb::WriteTransaction,
}

impl RedbWriteTxn {
    pub(crate) fn new(write: redb::WriteTransaction) -> Self {
        Self { write }
    }
}

impl Transaction for RedbWriteTxn {
    fn commit(self) -> Result<()> {
        self.write.commit()?;
        Ok(())
    }
}

impl ReadOperations for RedbWriteTxn {
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let table = self.write.open_table(tabledef(table))?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    fn count(&self, table: &str) -> Result<u64> {
        let table = self.write.open_table(tabledef(table))?;
        Ok(table.len()?)
    }

    fn range(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = self.write.open_table(tabledef(table))?;
        let bounds = (bound_as_ref(&range.start), bound_as_ref(&range.end));
        let mut out = Vec::new();
        for item in table.range::<&[u8]>(bounds)? {
            let (k, v) = item?;
            out.push((k.value().to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn range_multimap(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = self.write.open_multimap_table(multimap_tabledef(table))?;
        let bounds = (bound_as_ref(&range.start), bound_as_ref(&range.end));
        let mut out = Vec::new();
        for item in table.range::<&[u8]>(bounds)? {
            let (k, values) = item?;
            let key = k.value().to_vec();
            for value in values {
                out.push((key.clone(), value?.value().to_vec()));
            }
        }
        Ok(out)
    }

    fn get_multimap(&self, table: &str, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        let table = self.write.open_multimap_table(multimap_tabledef(table))?;
        let mut out = Vec::new();
        for value in table.get(key)? {
            out.push(value?.value().to_vec());
        }
        Ok(out)
    }

    fn count_multimap(&self, table: &str) -> Result<u64> {
        let table = self.write.open_multimap_table(multimap_tabledef(table))?;
        Ok(table.len()?)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names = self
            .write
            .list_tables()?
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>();
        names.extend(
            self.write
                .list_multimap_tables()?
                .map(|t| t.name().to_string()),
        );
        Ok(names)
    }
}

impl WriteOperations for RedbWriteTxn {
    fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut table = self.write.open_table(tabledef(table))?;
        Ok(table.insert(key, value)?.map(|v| v.value().to_vec()))
    }

    fn insert_append(&self, table: &str, key: &[u8], value: &[u8]) -> Result<()> {
        // `redb`'s B+tree has no distinct append-mode insert path the way
        // LMDB's `MDB_APPEND` flag does; a plain insert is the fast path
        // already as long as callers keep handing it increasing keys.
        let mut table = self.write.open_table(tabledef(table))?;
        table.insert(key, value)?;
        Ok(())
    }

    fn remove(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut table = self.write.open_table(tabledef(table))?;
        Ok(table.remove(key)?.map(|v| v.value().to_vec()))
    }

    fn delete_table(&self, table: &str) -> Result<()> {
        match self.write.delete_table(tabledef(table)) {
            Ok(_) | Err(TableError::TableDoesNotExist(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self, table: &str) -> Result<()> {
        let mut table = self.write.open_table(tabledef(table))?;
        let keys = table
            .range::<&[u8]>(..)?
            .map(|item| item.map(|(k, _)| k.value().to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        for key in keys {
            table.remove(key.as_slice())?;
        }
        Ok(())
    }

    fn insert_multimap(&self, table: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let mut table = self.write.open_multimap_table(multimap_tabledef(table))?;
        table.insert(key, value)?;
        Ok(())
    }

    fn remove_multimap(&self, table: &str, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut table = self.write.open_multimap_table(multimap_tabledef(table))?;
        Ok(table.remove(key, value)?)
    }

    fn remove_all_multimap(&self, table: &str, key: &[u8]) -> Result<()> {
        let mut table = self.write.open_multimap_table(multimap_tabledef(table))?;
        table.remove_all(key)?;
        Ok(())
    }

    fn delete_multimap_table(&self, table: &str) -> Result<()> {
        match self.write.delete_multimap_table(multimap_tabledef(table)) {
            Ok(_) | Err(TableError::TableDoesNotExist(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear_multimap(&self, table: &str) -> Result<()> {
        let mut table = self.write.open_multimap_table(multimap_tabledef(table))?;
        let keys = table
            .range::<&[u8]>(..)?
            .map(|item| item.map(|(k, _)| k.value().to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        for key in keys {
            table.remove_all(key.as_slice())?;
        }
        Ok(())
    }
}
