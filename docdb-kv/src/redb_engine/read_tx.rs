use std::ops::Bound;

use anyhow::Result;
use redb::ReadableDatabase;
use redb::ReadableMultimapTable;
use redb::ReadableTable;
use redb::TableError;

use crate::KeyRange;
use crate::ReadOperations;
use crate::Transaction;

use super::multimap_tabledef;
use super::tabledef;

fn bound_as_ref(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
    }
}

pub struct RedbReadTxn {
    read: redb::ReadTransaction,
}

impl RedbReadTxn {
    pub(crate) fn new(read: redb::ReadTransaction) -> Self {
        Self { read }
    }
}

impl Transaction for RedbReadTxn {
    fn commit(self) -> Result<()> {
        // Nothing to flush for a read-only snapshot; dropping it releases
        // the reader slot.
        Ok(())
    }
}

impl ReadOperations for RedbReadTxn {
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let table = match self.read.open_table(tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    fn count(&self, table: &str) -> Result<u64> {
        let table = match self.read.open_table(tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        Ok(table.len()?)
    }

    fn range(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = match self.read.open_table(tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let bounds = (bound_as_ref(&range.start), bound_as_ref(&range.end));
        let mut out = Vec::new();
        for item in table.range::<&[u8]>(bounds)? {
            let (k, v) = item?;
            out.push((k.value().to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn range_multimap(&self, table: &str, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = match self.read.open_multimap_table(multimap_tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
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
        let table = match self.read.open_multimap_table(multimap_tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for value in table.get(key)? {
            out.push(value?.value().to_vec());
        }
        Ok(out)
    }

    fn count_multimap(&self, table: &str) -> Result<u64> {
        let table = match self.read.open_multimap_table(multimap_tabledef(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        Ok(table.len()?)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names = self
            .read
            .list_tables()?
            .map(|t| t.name().to_string())
            .collect::<Vec<_>>();
        names.extend(
            self.read
                .list_multimap_tables()?
                .map(|t| t.name().to_string()),
        );
        Ok(names)
    }
}
