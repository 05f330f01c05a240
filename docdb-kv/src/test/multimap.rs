use anyhow::Result;

use crate::KeyRange;
use crate::KvEngine;
use crate::ReadOperations;
use crate::RedbEngine;
use crate::Transaction;
use crate::WriteOperations;

use super::rand_utf8;

#[test]
fn multimap_keeps_values_sorted_per_key() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    tx.insert_multimap(&table, b"k", b"c")?;
    tx.insert_multimap(&table, b"k", b"a")?;
    tx.insert_multimap(&table, b"k", b"b")?;
    tx.commit()?;

    let read = kv.read_tx()?;
    let values = read.get_multimap(&table, b"k")?;
    assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert_eq!(read.count_multimap(&table)?, 3);

    Ok(())
}

#[test]
fn multimap_remove_one_pair() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    tx.insert_multimap(&table, b"k", b"a")?;
    tx.insert_multimap(&table, b"k", b"b")?;
    tx.commit()?;

    let tx = kv.write_tx()?;
    let removed = tx.remove_multimap(&table, b"k", b"a")?;
    assert!(removed);
    let removed_again = tx.remove_multimap(&table, b"k", b"a")?;
    assert!(!removed_again);
    tx.commit()?;

    let read = kv.read_tx()?;
    assert_eq!(read.get_multimap(&table, b"k")?, vec![b"b".to_vec()]);

    Ok(())
}

#[test]
fn multimap_remove_all_for_key() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    tx.insert_multimap(&table, b"k", b"a")?;
    tx.insert_multimap(&table, b"k", b"b")?;
    tx.insert_multimap(&table, b"other", b"c")?;
    tx.commit()?;

    let tx = kv.write_tx()?;
    tx.remove_all_multimap(&table, b"k")?;
    tx.commit()?;

    let read = kv.read_tx()?;
    assert!(read.get_multimap(&table, b"k")?.is_empty());
    assert_eq!(read.get_multimap(&table, b"other")?, vec![b"c".to_vec()]);

    Ok(())
}

#[test]
fn multimap_range_flattens_in_key_then_value_order() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    tx.insert_multimap(&table, b"b", b"2")?;
    tx.insert_multimap(&table, b"a", b"2")?;
    tx.insert_multimap(&table, b"a", b"1")?;
    tx.commit()?;

    let read = kv.read_tx()?;
    let entries = read.range_multimap(&table, &KeyRange::all())?;
    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"a".to_vec(), b"2".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ]
    );

    Ok(())
}
