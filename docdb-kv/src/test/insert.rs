use anyhow::Result;

use crate::KeyRange;
use crate::KvEngine;
use crate::ReadOperations;
use crate::RedbEngine;
use crate::Transaction;
use crate::WriteOperations;

use super::rand_utf8;

#[test]
fn should_insert_and_get() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);
    let key = rand::random::<[u8; 32]>();
    let val = rand::random::<[u8; 32]>();

    let tx = kv.write_tx()?;
    let existing = tx.insert(&table, key.as_slice(), val.as_slice())?;
    assert!(existing.is_none());
    tx.commit()?;

    let read = kv.read_tx()?;
    let got = read
        .get(&table, key.as_slice())?
        .expect("value was not inserted");
    assert_eq!(got, val.to_vec());
    assert_eq!(read.count(&table)?, 1);
    assert_eq!(read.range(&table, &KeyRange::all())?.len(), 1);

    Ok(())
}

#[test]
fn should_return_previous_value_on_overwrite() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);
    let key = b"k".to_vec();

    let tx = kv.write_tx()?;
    tx.insert(&table, &key, b"first")?;
    let prev = tx.insert(&table, &key, b"second")?;
    tx.commit()?;

    assert_eq!(prev, Some(b"first".to_vec()));
    let read = kv.read_tx()?;
    assert_eq!(read.get(&table, &key)?, Some(b"second".to_vec()));

    Ok(())
}

#[test]
fn should_remove() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);
    let key = b"k".to_vec();

    let tx = kv.write_tx()?;
    tx.insert(&table, &key, b"v")?;
    tx.commit()?;

    let tx = kv.write_tx()?;
    let removed = tx.remove(&table, &key)?;
    tx.commit()?;
    assert_eq!(removed, Some(b"v".to_vec()));

    let read = kv.read_tx()?;
    assert_eq!(read.get(&table, &key)?, None);
    assert_eq!(read.count(&table)?, 0);

    Ok(())
}

#[test]
fn missing_table_reads_as_empty() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let read = kv.read_tx()?;
    assert_eq!(read.get("nonexistent", b"k")?, None);
    assert_eq!(read.count("nonexistent")?, 0);
    assert_eq!(read.range("nonexistent", &KeyRange::all())?.len(), 0);
    Ok(())
}

#[test]
fn append_insert_is_readable() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    for i in 0u32..50 {
        tx.insert_append(&table, &i.to_be_bytes(), b"v")?;
    }
    tx.commit()?;

    let read = kv.read_tx()?;
    assert_eq!(read.count(&table)?, 50);

    Ok(())
}
