//! A single secondary index: one named `redb` table, a compiled
//! [`Template`], and the duplicate/integer flags that pick which `docdb-kv`
//! operations it uses.

use docdb_kv::KeyRange;
use docdb_kv::ReadOperations;
use docdb_kv::WriteOperations;

use crate::document::Document;
use crate::error::Error;
use crate::error::Result;
use crate::template::Template;

/// One secondary index owned by a [`crate::table::Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: String,
    owner_table: String,
    template: Template,
    duplicates: bool,
    integer: bool,
}

impl Index {
    pub(crate) fn new(
        name: impl Into<String>,
        owner_table: impl Into<String>,
        template: Template,
        duplicates: bool,
        integer: bool,
    ) -> Self {
        Self {
            name: name.into(),
            owner_table: owner_table.into(),
            template,
            duplicates,
            integer,
        }
    }

    /// Index name, as passed to `Table::index`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled key-derivation template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Whether this index permits multiple primary keys per derived key.
    pub fn duplicates(&self) -> bool {
        self.duplicates
    }

    /// Whether this index's keys are 8-byte big-endian integers.
    pub fn integer(&self) -> bool {
        self.integer
    }

    /// Name of the backing `redb` table: `_<table>_<index>`.
    pub fn kv_table_name(&self) -> String {
        format!("_{}_{}", self.owner_table, self.name)
    }

    /// `put(txn, pk, doc)`: derive the key and write `(key -> pk)`, or
    /// no-op if the template skips `doc` (partial index).
    pub fn put(&self, tx: &impl WriteOperations, pk: &[u8], doc: &Document) -> Result<()> {
        let Some(key) = self.template.format(doc) else {
            return Ok(());
        };
        let table = self.kv_table_name();
        if self.duplicates {
            tx.insert_multimap(&table, &key, pk)
                .map_err(Error::WriteFail)?;
        } else {
            tx.insert(&table, &key, pk).map_err(Error::WriteFail)?;
        }
        Ok(())
    }

    /// `delete(txn, pk, doc)`: symmetric with [`Index::put`]. The template
    /// must be consulted against `doc` before removing, since a partial
    /// index never wrote an entry for it in the first place.
    pub fn delete(&self, tx: &impl WriteOperations, pk: &[u8], doc: &Document) -> Result<()> {
        let Some(key) = self.template.format(doc) else {
            return Ok(());
        };
        let table = self.kv_table_name();
        if self.duplicates {
            tx.remove_multimap(&table, &key, pk)
                .map_err(Error::WriteFail)?;
        } else {
            tx.remove(&table, &key).map_err(Error::WriteFail)?;
        }
        Ok(())
    }

    /// Point lookup: derive a key from `template_doc` and return the first
    /// matching primary key, if any.
    pub fn get(&self, tx: &impl ReadOperations, template_doc: &Document) -> Result<Option<Vec<u8>>> {
        let Some(key) = self.template.format(template_doc) else {
            return Ok(None);
        };
        let table = self.kv_table_name();
        if self.duplicates {
            let mut values = tx.get_multimap(&table, &key).map_err(Error::WriteFail)?;
            Ok(if values.is_empty() {
                None
            } else {
                Some(values.remove(0))
            })
        } else {
            tx.get(&table, &key).map_err(Error::WriteFail)
        }
    }

    /// All `(key, pk)` pairs whose key falls within `template_doc`'s
    /// derived key, i.e. an equality seek.
    pub fn seek(&self, tx: &impl ReadOperations, template_doc: &Document) -> Result<Vec<Vec<u8>>> {
        let Some(key) = self.template.format(template_doc) else {
            return Ok(Vec::new());
        };
        let table = self.kv_table_name();
        if self.duplicates {
            tx.get_multimap(&table, &key).map_err(Error::WriteFail)
        } else {
            Ok(tx
                .get(&table, &key)
                .map_err(Error::WriteFail)?
                .into_iter()
                .collect())
        }
    }

    /// Entry count, via the backing table's `len`.
    pub fn count(&self, tx: &impl ReadOperations) -> Result<u64> {
        let table = self.kv_table_name();
        if self.duplicates {
            tx.count_multimap(&table).map_err(Error::WriteFail)
        } else {
            tx.count(&table).map_err(Error::WriteFail)
        }
    }

    /// Empty the backing table, keeping the handle and catalog entry.
    pub fn drop_contents(&self, tx: &impl WriteOperations) -> Result<()> {
        let table = self.kv_table_name();
        if self.duplicates {
            tx.clear_multimap(&table).map_err(Error::WriteFail)
        } else {
            tx.clear(&table).map_err(Error::WriteFail)
        }
    }

    /// Delete the backing table entirely (used by `Table::drop`/`unindex`).
    pub fn drop_table(&self, tx: &impl WriteOperations) -> Result<()> {
        let table = self.kv_table_name();
        if self.duplicates {
            tx.delete_multimap_table(&table).map_err(Error::WriteFail)
        } else {
            tx.delete_table(&table).map_err(Error::WriteFail)
        }
    }

    /// Ordered `(key, pk)` pairs within `range`, used by `Table::range`.
    pub fn range(&self, tx: &impl ReadOperations, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = self.kv_table_name();
        if self.duplicates {
            tx.range_multimap(&table, range).map_err(Error::WriteFail)
        } else {
            tx.range(&table, range).map_err(Error::WriteFail)
        }
    }
}
