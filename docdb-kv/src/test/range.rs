use std::ops::Bound;

use anyhow::Result;

use crate::KeyRange;
use crate::KvEngine;
use crate::ReadOperations;
use crate::RedbEngine;
use crate::Transaction;
use crate::WriteOperations;

use super::rand_utf8;

#[test]
fn range_ascending_order() -> Result<()> {
    const LEN: usize = 100;

    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    let mut keys = Vec::<[u8; 4]>::default();
    for _ in 0..LEN {
        let key = rand::random::<u32>().to_be_bytes();
        keys.push(key);
        tx.insert(&table, &key, &[0; 4])?;
    }
    tx.commit()?;
    keys.sort();
    keys.dedup();

    let read = kv.read_tx()?;
    let all = read.range(&table, &KeyRange::all())?;
    assert_eq!(all.len(), keys.len());
    for (stored, expected) in all.iter().zip(keys.iter()) {
        assert_eq!(stored.0.as_slice(), expected.as_slice());
    }

    Ok(())
}

#[test]
fn range_bounds_are_respected() -> Result<()> {
    let kv = RedbEngine::in_memory(None)?;
    let table = rand_utf8(10);

    let tx = kv.write_tx()?;
    for i in 0u8..10 {
        tx.insert(&table, &[i], &[0])?;
    }
    tx.commit()?;

    let read = kv.read_tx()?;

    let inclusive = read.range(
        &table,
        &KeyRange::from_bounds(Bound::Included(vec![3]), Bound::Included(vec![6])),
    )?;
    assert_eq!(
        inclusive.iter().map(|(k, _)| k[0]).collect::<Vec<_>>(),
        vec![3, 4, 5, 6]
    );

    let exclusive = read.range(
        &table,
        &KeyRange::from_bounds(Bound::Excluded(vec![3]), Bound::Excluded(vec![6])),
    )?;
    assert_eq!(
        exclusive.iter().map(|(k, _)| k[0]).collect::<Vec<_>>(),
        vec![4, 5]
    );

    let unbounded_below = read.range(&table, &KeyRange::from_bounds(Bound::Unbounded, Bound::Included(vec![1])))?;
    assert_eq!(
        unbounded_below.iter().map(|(k, _)| k[0]).collect::<Vec<_>>(),
        vec![0, 1]
    );

    Ok(())
}

#[test]
fn key_range_contains_matches_bound_semantics() {
    let r = KeyRange::from_bounds(Bound::Included(vec![1]), Bound::Excluded(vec![5]));
    assert!(!r.contains(&[0]));
    assert!(r.contains(&[1]));
    assert!(r.contains(&[4]));
    assert!(!r.contains(&[5]));
}
