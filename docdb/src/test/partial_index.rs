use anyhow::Result;
use serde_json::json;

use super::doc;
use super::test_db;

/// A document missing a field referenced by one index is absent from
/// that index but still present in the primary table and in any other
/// index whose template it does satisfy.
#[test]
fn missing_field_is_absent_only_from_its_own_index() -> Result<()> {
    let mut db = test_db();
    let table = db.table_mut("demo1")?;
    table.index("by_age", "{age:03}", true, false)?;
    table.index("by_admin", "{admin}", true, false)?;

    let with_admin = table.append(doc(json!({"name": "A", "age": 10, "admin": true})))?;
    let without_admin = table.append(doc(json!({"name": "B", "age": 20})))?;

    assert_eq!(table.records()?, 2);
    assert_eq!(table.find(Some("by_age"), None, None)?.len(), 2);

    let admins = table.find(Some("by_admin"), None, None)?;
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id(), Some(with_admin.as_str()));

    // the document without `admin` is still reachable through the primary
    // table and the index it does satisfy.
    let primary = table.get(without_admin.as_bytes())?;
    assert_eq!(primary.get("name").unwrap().as_str(), Some("B"));

    Ok(())
}

/// `index()` does not sweep existing documents; the index starts empty
/// until `reindex()` is called, at which point it only picks up the
/// documents that satisfy its template.
#[test]
fn index_created_after_data_only_covers_matching_documents_once_reindexed() -> Result<()> {
    let mut db = test_db();
    let table = db.table_mut("demo1")?;

    table.append(doc(json!({"name": "A", "admin": true})))?;
    table.append(doc(json!({"name": "B"})))?;

    table.index("by_admin", "{admin}", true, false)?;
    assert_eq!(
        table.find(Some("by_admin"), None, None)?.len(),
        0,
        "newly created index must not see documents inserted before it existed"
    );

    table.reindex()?;
    assert_eq!(table.find(Some("by_admin"), None, None)?.len(), 1);

    Ok(())
}
