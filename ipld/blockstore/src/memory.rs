// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, Store};
use ahash::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// A thread-safe in-memory store. Writes of identical content are idempotent
/// by construction, which is all the content-addressed layer requires.
#[derive(Debug, Default, Clone)]
pub struct MemoryDB {
    db: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl Store for MemoryDB {
    fn read<K>(&self, key: K) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.db.read().get(key.as_ref()).cloned())
    }

    fn write<K, V>(&self, key: K, value: V) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.db
            .write()
            .insert(key.as_ref().to_vec(), value.as_ref().to_vec());
        Ok(())
    }

    fn exists<K>(&self, key: K) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.db.read().contains_key(key.as_ref()))
    }

    fn delete<K>(&self, key: K) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        self.db.write().remove(key.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockStore;
    use cid::multihash::Code;

    #[test]
    fn mem_db_roundtrip() {
        let db = MemoryDB::default();
        let val = "sample value".to_string();
        let cid = db.put(&val, Code::Blake2b256).unwrap();
        let back: String = db.get(&cid).unwrap().unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn put_is_idempotent() {
        let db = MemoryDB::default();
        let val = "content".to_string();
        let c1 = db.put(&val, Code::Blake2b256).unwrap();
        let c2 = db.put(&val, Code::Blake2b256).unwrap();
        assert_eq!(c1, c2);
        assert!(db.get_bytes(&c1).unwrap().is_some());
    }

    #[test]
    fn raw_blocks_are_codec_distinct() {
        let db = MemoryDB::default();
        let bytes = vec![1u8, 2, 3];
        let raw = db.put_raw(bytes.clone(), Code::Blake2b256).unwrap();
        assert_eq!(db.get_bytes(&raw).unwrap(), Some(bytes.clone()));

        // the same payload stored as cbor commits to a different identity
        let typed = db
            .put(&serde_bytes::ByteBuf::from(bytes), Code::Blake2b256)
            .unwrap();
        assert_ne!(raw, typed);
    }
}
