// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_blockstore::MemoryDB;
use arbor_hamt::{BytesKey, Hamt};

fn tstring(v: impl std::fmt::Display) -> BytesKey {
    BytesKey(v.to_string().into_bytes())
}

#[test]
fn test_basics() {
    let store = MemoryDB::default();
    let mut hamt = Hamt::<_, String, _>::new(&store);
    hamt.set(tstring(1), "world".to_string()).unwrap();

    assert_eq!(hamt.get(&tstring(1)).unwrap(), Some(&"world".to_string()));
    hamt.set(tstring(1), "world2".to_string()).unwrap();
    assert_eq!(hamt.get(&tstring(1)).unwrap(), Some(&"world2".to_string()));
    assert_eq!(hamt.get(&tstring(2)).unwrap(), None);
}

#[test]
fn test_load() {
    let store = MemoryDB::default();

    let mut hamt: Hamt<_, _, BytesKey> = Hamt::new(&store);
    hamt.set(tstring(1), "world".to_string()).unwrap();

    assert_eq!(hamt.get(&tstring(1)).unwrap(), Some(&"world".to_string()));
    let c = hamt.flush().unwrap();

    let new_hamt = Hamt::<_, String, _>::load(&c, &store).unwrap();
    assert_eq!(new_hamt.get(&tstring(1)).unwrap(), Some(&"world".to_string()));

    // set value in the first one
    hamt.set(tstring(2), "stuff".to_string()).unwrap();

    // loading original hash should not be modified
    let new_hamt = Hamt::<_, String, _>::load(&c, &store).unwrap();
    assert_eq!(new_hamt.get(&tstring(2)).unwrap(), None);

    // loading new hash
    let c2 = hamt.flush().unwrap();
    let new_hamt = Hamt::<_, String, _>::load(&c2, &store).unwrap();
    assert_eq!(new_hamt.get(&tstring(2)).unwrap(), Some(&"stuff".to_string()));

    // loading from an empty store does not work
    let empty_store = MemoryDB::default();
    assert!(Hamt::<_, String, BytesKey>::load(&c2, &empty_store).is_err());

    // storing the hamt should produce the same cid as storing the root node
    let c3 = hamt.flush().unwrap();
    assert_eq!(c3, c2);
}

#[test]
fn delete() {
    let store = MemoryDB::default();

    let mut hamt: Hamt<_, String> = Hamt::new(&store);
    hamt.set(tstring("foo"), "cat dog bear".to_string()).unwrap();
    hamt.set(tstring("bar"), "cat dog".to_string()).unwrap();
    hamt.set(tstring("baz"), "cat".to_string()).unwrap();

    let c = hamt.flush().unwrap();

    let mut h2 = Hamt::<_, String>::load(&c, &store).unwrap();
    let (k, v) = h2.delete(&tstring("foo")).unwrap().unwrap();
    assert_eq!((k, v), (tstring("foo"), "cat dog bear".to_string()));
    assert_eq!(h2.get(&tstring("foo")).unwrap(), None);
    assert_eq!(h2.get(&tstring("bar")).unwrap(), Some(&"cat dog".to_string()));

    // deleting again is a no-op
    assert_eq!(h2.delete(&tstring("foo")).unwrap(), None);
}

#[test]
fn reload_empty() {
    let store = MemoryDB::default();

    let mut hamt: Hamt<_, ()> = Hamt::new(&store);
    let c = hamt.flush().unwrap();
    let h2 = Hamt::<_, ()>::load(&c, &store).unwrap();
    assert!(h2.is_empty());
}

#[test]
fn sharding_and_collisions_roundtrip() {
    let store = MemoryDB::default();

    let mut hamt: Hamt<_, u64> = Hamt::new(&store);
    const COUNT: u64 = 200;
    for i in 0..COUNT {
        hamt.set(tstring(i), i).unwrap();
    }
    let c = hamt.flush().unwrap();

    let loaded = Hamt::<_, u64>::load(&c, &store).unwrap();
    for i in 0..COUNT {
        assert_eq!(loaded.get(&tstring(i)).unwrap(), Some(&i));
    }

    // for_each visits every entry exactly once
    let mut visited = 0u64;
    loaded
        .for_each(|_, _| {
            visited += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(visited, COUNT);
}

#[test]
fn set_delete_many() {
    let store = MemoryDB::default();

    let mut hamt: Hamt<_, u64> = Hamt::new_with_bit_width(&store, 5);
    for i in 0..200 {
        hamt.set(tstring(i), i).unwrap();
    }
    let c1 = hamt.flush().unwrap();

    for i in 100..200 {
        assert!(hamt.delete(&tstring(i)).unwrap().is_some());
    }
    let c2 = hamt.flush().unwrap();
    assert_ne!(c1, c2);

    let loaded = Hamt::<_, u64>::load_with_bit_width(&c2, &store, 5).unwrap();
    for i in 0..100 {
        assert_eq!(loaded.get(&tstring(i)).unwrap(), Some(&i));
    }
    for i in 100..200 {
        assert_eq!(loaded.get(&tstring(i)).unwrap(), None);
    }
}

#[test]
fn canonical_structure() {
    // Insertion order should not affect the flushed root.
    let store1 = MemoryDB::default();
    let store2 = MemoryDB::default();

    let mut h1: Hamt<_, u64> = Hamt::new(&store1);
    let mut h2: Hamt<_, u64> = Hamt::new(&store2);
    for i in 0..50 {
        h1.set(tstring(i), i).unwrap();
    }
    for i in (0..50).rev() {
        h2.set(tstring(i), i).unwrap();
    }
    assert_eq!(h1.flush().unwrap(), h2.flush().unwrap());
}
