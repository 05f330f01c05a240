//! Catalog: per-index descriptors persisted so indexes can be rehydrated on
//! reopen.
//!
//! `redb` has no unnamed/root table the way LMDB does, so descriptors live
//! in one fixed, well-known table instead of an implicit root database.

use std::ops::Bound;

use docdb_kv::KeyRange;
use docdb_kv::ReadOperations;
use docdb_kv::WriteOperations;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// Fixed table holding every index descriptor, across every table in the
/// database.
pub const CATALOG_TABLE: &str = "__catalog__";

/// Serialized, persisted form of an [`crate::index::Index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// The template source string, recompiled on rehydrate.
    pub template: String,
    /// Whether the backing table is a `redb` multimap (duplicate keys).
    pub duplicates: bool,
    /// Whether the template is interpreted as an integer key.
    pub integer: bool,
}

/// Catalog key for one index descriptor: `@_<table>_<index>`.
pub fn descriptor_key(table: &str, index: &str) -> Vec<u8> {
    format!("@_{table}_{index}").into_bytes()
}

/// Persist a descriptor for `table`/`index`.
pub fn put_descriptor(
    tx: &impl WriteOperations,
    table: &str,
    index: &str,
    descriptor: &IndexDescriptor,
) -> Result<()> {
    let bytes = serde_json::to_vec(descriptor)?;
    tx.insert(CATALOG_TABLE, &descriptor_key(table, index), &bytes)
        .map_err(Error::WriteFail)?;
    Ok(())
}

/// Remove a descriptor, e.g. on `unindex`/`drop_index`.
pub fn remove_descriptor(tx: &impl WriteOperations, table: &str, index: &str) -> Result<()> {
    tx.remove(CATALOG_TABLE, &descriptor_key(table, index))
        .map_err(Error::WriteFail)?;
    Ok(())
}

/// Remove every descriptor belonging to `table`, e.g. on `Table::drop`.
pub fn remove_table_descriptors(tx: &impl WriteOperations, table: &str) -> Result<()> {
    for (index_name, _) in descriptors_for_table(tx, table)? {
        remove_descriptor(tx, table, &index_name)?;
    }
    Ok(())
}

/// Enumerate every index descriptor belonging to `table`, in catalog-key
/// order (not necessarily index-creation order).
pub fn descriptors_for_table(
    tx: &impl ReadOperations,
    table: &str,
) -> Result<Vec<(String, IndexDescriptor)>> {
    let prefix = format!("@_{table}_");
    let range = KeyRange::from_bounds(Bound::Included(prefix.clone().into_bytes()), Bound::Unbounded);
    let entries = tx.range(CATALOG_TABLE, &range).map_err(Error::WriteFail)?;

    let mut out = Vec::new();
    for (key, value) in entries {
        let key_str = String::from_utf8_lossy(&key);
        if !key_str.starts_with(&prefix) {
            // catalog keys are ordered; once the prefix stops matching we've
            // moved on to a different table's entries.
            break;
        }
        let index_name = key_str[prefix.len()..].to_string();
        let descriptor: IndexDescriptor = serde_json::from_slice(&value)?;
        out.push((index_name, descriptor));
    }
    Ok(out)
}
