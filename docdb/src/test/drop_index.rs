use anyhow::Result;
use serde_json::json;

use super::doc;
use super::test_db;
use crate::error::Error;

/// `drop_index` removes both the catalog entry and the backing table;
/// a subsequent `index()` with the same name starts empty.
#[test]
fn drop_index_then_recreate_starts_empty() -> Result<()> {
    let mut db = test_db();
    let table = db.table_mut("demo1")?;
    table.index("by_age", "{age:03}", true, false)?;
    table.append(doc(json!({"age": 21})))?;
    table.append(doc(json!({"age": 40})))?;
    assert_eq!(table.find(Some("by_age"), None, None)?.len(), 2);

    table.drop_index("by_age")?;
    assert!(table.indexes().is_empty());
    match table.find(Some("by_age"), None, None) {
        Err(Error::IndexMissing { .. }) => {}
        other => panic!("expected IndexMissing, got {other:?}"),
    }

    table.index("by_age", "{age:03}", true, false)?;
    assert_eq!(
        table.find(Some("by_age"), None, None)?.len(),
        0,
        "recreated index must not see documents inserted before it existed"
    );

    Ok(())
}

/// Creating a duplicate index name is rejected.
#[test]
fn index_with_duplicate_name_is_rejected() -> Result<()> {
    let mut db = test_db();
    let table = db.table_mut("demo1")?;
    table.index("by_age", "{age:03}", true, false)?;

    match table.index("by_age", "{age}", false, false) {
        Err(Error::IndexExists { .. }) => {}
        other => panic!("expected IndexExists, got {other:?}"),
    }

    Ok(())
}

/// Malformed templates are rejected eagerly, at index-creation time.
#[test]
fn malformed_template_is_rejected_at_index_creation() -> Result<()> {
    let mut db = test_db();
    let table = db.table_mut("demo1")?;

    assert!(table.index("broken", "{age", false, false).is_err());
    assert!(table.index("broken2", "age}", false, false).is_err());
    assert!(table.index("broken3", "!doc.age", false, false).is_err());

    Ok(())
}
