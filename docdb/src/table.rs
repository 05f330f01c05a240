//! A table: a primary `redb` table keyed by primary id, plus a set of
//! secondary [`Index`]es kept consistent with it on every write.

use std::ops::Bound;
use std::sync::Arc;

use docdb_kv::KeyRange;
use docdb_kv::KvEngine;
use docdb_kv::ReadOperations;
use docdb_kv::Transaction;
use docdb_kv::WriteOperations;

use crate::catalog;
use crate::catalog::IndexDescriptor;
use crate::document::Document;
use crate::error::Error;
use crate::error::Result;
use crate::index::Index;
use crate::template::Template;

fn primary_key_bytes(doc: &Document) -> Option<Vec<u8>> {
    doc.id().map(|id| id.as_bytes().to_vec())
}

/// A collection of documents plus the secondary indexes derived from them.
pub struct Table<E: KvEngine> {
    name: String,
    kv: Arc<E>,
    indexes: Vec<Index>,
}

impl<E: KvEngine> Table<E> {
    /// Open (or implicitly create) `name`, rehydrating its indexes strictly
    /// from catalog entries, never inferred.
    pub(crate) fn open(kv: Arc<E>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let tx = kv.read_tx().map_err(Error::WriteFail)?;
        let mut indexes = Vec::new();
        for (index_name, descriptor) in catalog::descriptors_for_table(&tx, &name)? {
            let template = Template::compile(&descriptor.template, descriptor.integer)?;
            indexes.push(Index::new(
                index_name,
                name.clone(),
                template,
                descriptor.duplicates,
                descriptor.integer,
            ));
        }
        log::debug!("table \"{name}\": opened with {} indexes", indexes.len());
        Ok(Self { name, kv, indexes })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of every live index, in catalog order.
    pub fn indexes(&self) -> Vec<String> {
        self.indexes.iter().map(|i| i.name().to_string()).collect()
    }

    fn index_named(&self, name: &str) -> Result<&Index> {
        self.indexes.iter().find(|i| i.name() == name).ok_or_else(|| Error::IndexMissing {
            table: self.name.clone(),
            index: name.to_string(),
        })
    }

    /// Row count of the primary table.
    pub fn records(&self) -> Result<u64> {
        let tx = self.kv.read_tx().map_err(Error::WriteFail)?;
        tx.count(&self.name).map_err(Error::WriteFail)
    }

    /// Point lookup by primary key.
    pub fn get(&self, pk: &[u8]) -> Result<Document> {
        let tx = self.kv.read_tx().map_err(Error::WriteFail)?;
        let bytes = tx
            .get(&self.name, pk)
            .map_err(Error::WriteFail)?
            .ok_or_else(|| Error::NotFound(String::from_utf8_lossy(pk).into_owned()))?;
        Document::from_bytes(&bytes)
    }

    fn append_in_tx(&self, tx: &impl WriteOperations, doc: &mut Document) -> Result<String> {
        let id = doc.assign_id();
        let bytes = doc.to_bytes()?;
        tx.insert_append(&self.name, id.as_bytes(), &bytes)
            .map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.put(tx, id.as_bytes(), doc)?;
        }
        Ok(id)
    }

    /// Mint a primary key, write the document and every index entry, all
    /// in one writer transaction. Returns the new `_id`.
    pub fn append(&self, mut doc: Document) -> Result<String> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        let id = self.append_in_tx(&tx, &mut doc)?;
        tx.commit().map_err(Error::WriteFail)?;
        log::debug!("table \"{}\": appended {id}", self.name);
        Ok(id)
    }

    /// Like [`Table::append`], but runs within an ambient writer
    /// transaction supplied by the caller (e.g. `Database::begin`) instead
    /// of opening and committing its own.
    pub fn append_with(&self, tx: &E::WriteTxn, doc: &mut Document) -> Result<String> {
        self.append_in_tx(tx, doc)
    }

    fn save_in_tx(&self, tx: &impl WriteOperations, doc: &Document) -> Result<()> {
        let id = doc.require_id()?.to_string();
        let id_bytes = id.as_bytes();
        if let Some(prev_bytes) = tx.get(&self.name, id_bytes).map_err(Error::WriteFail)? {
            let prev = Document::from_bytes(&prev_bytes)?;
            for index in &self.indexes {
                index.delete(tx, id_bytes, &prev)?;
            }
        }
        let bytes = doc.to_bytes()?;
        tx.insert(&self.name, id_bytes, &bytes).map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.put(tx, id_bytes, doc)?;
        }
        Ok(())
    }

    /// Replace an existing document (identified by its `_id`). Every index
    /// entry is deleted using the *previous* document and reinserted using
    /// the new one, even for fields an index doesn't reference.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        self.save_in_tx(&tx, doc)?;
        tx.commit().map_err(Error::WriteFail)?;
        Ok(())
    }

    /// Like [`Table::save`], but runs within an ambient writer transaction.
    pub fn save_with(&self, tx: &E::WriteTxn, doc: &Document) -> Result<()> {
        self.save_in_tx(tx, doc)
    }

    fn delete_one_in_tx(&self, tx: &impl WriteOperations, pk: &[u8]) -> Result<()> {
        let Some(bytes) = tx.get(&self.name, pk).map_err(Error::WriteFail)? else {
            return Err(Error::NotFound(String::from_utf8_lossy(pk).into_owned()));
        };
        let doc = Document::from_bytes(&bytes)?;
        tx.remove(&self.name, pk).map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.delete(tx, pk, &doc)?;
        }
        Ok(())
    }

    /// Delete one document by primary key.
    pub fn delete(&self, pk: &[u8]) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        self.delete_one_in_tx(&tx, pk)?;
        tx.commit().map_err(Error::WriteFail)?;
        Ok(())
    }

    /// Like [`Table::delete`], but runs within an ambient writer
    /// transaction.
    pub fn delete_with(&self, tx: &E::WriteTxn, pk: &[u8]) -> Result<()> {
        self.delete_one_in_tx(tx, pk)
    }

    /// Delete a batch of documents atomically: all succeed or the whole
    /// transaction is aborted.
    pub fn delete_many(&self, pks: &[Vec<u8>]) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        for pk in pks {
            self.delete_one_in_tx(&tx, pk)?;
        }
        tx.commit().map_err(Error::WriteFail)?;
        Ok(())
    }

    /// Iterate the primary table (`index = None`) or a named index,
    /// dereferencing index entries through the primary table, applying an
    /// optional post-filter predicate and an optional result limit.
    ///
    /// Returns a materialized `Vec`: the underlying reader transaction is
    /// released as soon as this call returns rather than staying open for a
    /// lazily-resumable cursor.
    pub fn find(
        &self,
        index: Option<&str>,
        limit: Option<usize>,
        expression: Option<&dyn Fn(&Document) -> bool>,
    ) -> Result<Vec<Document>> {
        let tx = self.kv.read_tx().map_err(Error::WriteFail)?;
        let mut out = Vec::new();
        match index {
            None => {
                for (_, value) in tx.range(&self.name, &KeyRange::all()).map_err(Error::WriteFail)? {
                    let doc = Document::from_bytes(&value)?;
                    if expression.is_some_and(|expr| !expr(&doc)) {
                        continue;
                    }
                    out.push(doc);
                    if limit.is_some_and(|limit| out.len() >= limit) {
                        break;
                    }
                }
            }
            Some(index_name) => {
                let idx = self.index_named(index_name)?;
                for (_, pk) in idx.range(&tx, &KeyRange::all())? {
                    let Some(bytes) = tx.get(&self.name, &pk).map_err(Error::WriteFail)? else {
                        continue;
                    };
                    let doc = Document::from_bytes(&bytes)?;
                    if expression.is_some_and(|expr| !expr(&doc)) {
                        continue;
                    }
                    out.push(doc);
                    if limit.is_some_and(|limit| out.len() >= limit) {
                        break;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Equality lookup: every document whose derived key on `index` equals
    /// the key derived from `template_doc`.
    pub fn seek(&self, index: &str, template_doc: &Document) -> Result<Vec<Document>> {
        let tx = self.kv.read_tx().map_err(Error::WriteFail)?;
        let idx = self.index_named(index)?;
        let mut out = Vec::new();
        for pk in idx.seek(&tx, template_doc)? {
            if let Some(bytes) = tx.get(&self.name, &pk).map_err(Error::WriteFail)? {
                out.push(Document::from_bytes(&bytes)?);
            }
        }
        Ok(out)
    }

    /// Convenience wrapper around [`Table::seek`] returning the first
    /// match, or [`Error::NotFound`].
    pub fn seek_one(&self, index: &str, template_doc: &Document) -> Result<Document> {
        self.seek(index, template_doc)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no match in index \"{index}\"")))
    }

    /// Ranged scan, ascending by key. `lower`/`upper` are `None` for
    /// unbounded; when `index` is `None` they are `{_id: ...}` shapes
    /// scanned against the primary table.
    pub fn range(
        &self,
        index: Option<&str>,
        lower: Option<&Document>,
        upper: Option<&Document>,
        inclusive: bool,
    ) -> Result<Vec<Document>> {
        let tx = self.kv.read_tx().map_err(Error::WriteFail)?;

        let key_of = |doc: &Document| -> Result<Vec<u8>> {
            let key = match index {
                None => primary_key_bytes(doc),
                Some(name) => self.index_named(name)?.template().format(doc),
            };
            key.ok_or_else(|| Error::TemplateSyntax {
                template: index.unwrap_or("_id").to_string(),
                reason: "range bound document is missing the indexed field".to_string(),
            })
        };

        let lower_bound = match lower {
            None => Bound::Unbounded,
            Some(doc) => {
                let key = key_of(doc)?;
                if inclusive { Bound::Included(key) } else { Bound::Excluded(key) }
            }
        };
        let upper_bound = match upper {
            None => Bound::Unbounded,
            Some(doc) => {
                let key = key_of(doc)?;
                if inclusive { Bound::Included(key) } else { Bound::Excluded(key) }
            }
        };
        let range = KeyRange::from_bounds(lower_bound, upper_bound);

        let mut out = Vec::new();
        match index {
            None => {
                for (_, value) in tx.range(&self.name, &range).map_err(Error::WriteFail)? {
                    out.push(Document::from_bytes(&value)?);
                }
            }
            Some(index_name) => {
                let idx = self.index_named(index_name)?;
                for (_, pk) in idx.range(&tx, &range)? {
                    if let Some(bytes) = tx.get(&self.name, &pk).map_err(Error::WriteFail)? {
                        out.push(Document::from_bytes(&bytes)?);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Clear and rebuild every index from the current contents of the
    /// primary table, inside one writer transaction.
    pub fn reindex(&self) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.drop_contents(&tx)?;
        }
        for (pk, bytes) in tx.range(&self.name, &KeyRange::all()).map_err(Error::WriteFail)? {
            let doc = Document::from_bytes(&bytes)?;
            for index in &self.indexes {
                index.put(&tx, &pk, &doc)?;
            }
        }
        tx.commit().map_err(Error::WriteFail)?;
        log::info!("table \"{}\": reindexed {} indexes", self.name, self.indexes.len());
        Ok(())
    }

    /// Truncate the primary table and every index, preserving catalog
    /// entries and the `Table`/`Index` handles.
    pub fn empty(&self) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        tx.clear(&self.name).map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.drop_contents(&tx)?;
        }
        tx.commit().map_err(Error::WriteFail)?;
        Ok(())
    }

    /// Remove every index (catalog entry + backing table), then the
    /// primary table itself. Used by `Database::drop`.
    pub(crate) fn drop_all(&self) -> Result<()> {
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        for index in &self.indexes {
            index.drop_table(&tx)?;
            catalog::remove_descriptor(&tx, &self.name, index.name())?;
        }
        tx.delete_table(&self.name).map_err(Error::WriteFail)?;
        tx.commit().map_err(Error::WriteFail)?;
        log::info!("table \"{}\": dropped", self.name);
        Ok(())
    }

    /// Create a new secondary index, compiling and validating `template`
    /// eagerly. The index starts empty; it does not sweep documents already
    /// in the table. Call `reindex()` to populate it from existing data.
    pub fn index(&mut self, name: &str, template: &str, duplicates: bool, integer: bool) -> Result<()> {
        if self.indexes.iter().any(|i| i.name() == name) {
            return Err(Error::IndexExists {
                table: self.name.clone(),
                index: name.to_string(),
            });
        }
        let compiled = Template::compile(template, integer)?;
        let index = Index::new(name, self.name.clone(), compiled, duplicates, integer);

        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        let descriptor = IndexDescriptor {
            template: template.to_string(),
            duplicates,
            integer,
        };
        catalog::put_descriptor(&tx, &self.name, name, &descriptor)?;
        tx.commit().map_err(Error::WriteFail)?;

        self.indexes.push(index);
        log::debug!("table \"{}\": created index \"{name}\"", self.name);
        Ok(())
    }

    /// Remove an index: its catalog entry and backing table are deleted. A
    /// subsequent `index()` call with the same name starts empty.
    pub fn unindex(&mut self, name: &str) -> Result<()> {
        let pos = self
            .indexes
            .iter()
            .position(|i| i.name() == name)
            .ok_or_else(|| Error::IndexMissing {
                table: self.name.clone(),
                index: name.to_string(),
            })?;
        let index = self.indexes.remove(pos);
        let tx = self.kv.write_tx().map_err(Error::WriteFail)?;
        index.drop_table(&tx)?;
        catalog::remove_descriptor(&tx, &self.name, name)?;
        tx.commit().map_err(Error::WriteFail)?;
        log::debug!("table \"{}\": dropped index \"{name}\"", self.name);
        Ok(())
    }

    /// Alias for [`Table::unindex`]; both names refer to one contract.
    pub fn drop_index(&mut self, name: &str) -> Result<()> {
        self.unindex(name)
    }
}
