// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{BytesKey, Error, Node, DEFAULT_BIT_WIDTH};
use arbor_blockstore::BlockStore;
use cid::multihash::Code;
use cid::Cid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;

/// Implementation of the HAMT data structure for IPLD.
///
/// # Examples
///
/// ```
/// use arbor_hamt::{BytesKey, Hamt};
///
/// let store = arbor_blockstore::MemoryDB::default();
///
/// let mut map: Hamt<_, _, BytesKey> = Hamt::new(&store);
/// map.set(BytesKey::from(&b"a"[..]), "value".to_string()).unwrap();
/// assert_eq!(map.get(&BytesKey::from(&b"a"[..])).unwrap(), Some(&"value".to_string()));
/// let cid = map.flush().unwrap();
/// ```
#[derive(Debug)]
pub struct Hamt<'db, BS, V, K = BytesKey> {
    root: Node<K, V>,
    store: &'db BS,
    bit_width: u32,
}

impl<'db, BS, V, K> Hamt<'db, BS, V, K>
where
    BS: BlockStore,
    K: Eq + PartialOrd + AsRef<[u8]> + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    pub fn new(store: &'db BS) -> Self {
        Self::new_with_bit_width(store, DEFAULT_BIT_WIDTH)
    }

    /// Construct a tree with a custom bit width.
    pub fn new_with_bit_width(store: &'db BS, bit_width: u32) -> Self {
        Self {
            root: Node::default(),
            store,
            bit_width,
        }
    }

    /// Lazily instantiate a tree from a root Cid.
    pub fn load(cid: &Cid, store: &'db BS) -> Result<Self, Error> {
        Self::load_with_bit_width(cid, store, DEFAULT_BIT_WIDTH)
    }

    /// Lazily instantiate a tree from a root Cid with a custom bit width.
    pub fn load_with_bit_width(cid: &Cid, store: &'db BS, bit_width: u32) -> Result<Self, Error> {
        match store.get(cid)? {
            Some(root) => Ok(Self {
                root,
                store,
                bit_width,
            }),
            None => Err(Error::CidNotFound(cid.to_string())),
        }
    }

    /// Returns a reference to the underlying store of the tree.
    pub fn store(&self) -> &'db BS {
        self.store
    }

    /// Inserts a key-value pair into the tree, returning the previous value
    /// at that key if there was one.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>, Error> {
        self.root.set(key, value, self.store, self.bit_width)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, k: &K) -> Result<Option<&V>, Error> {
        self.root.get(k, self.store, self.bit_width)
    }

    /// Returns true if the key is present in the tree.
    pub fn contains_key(&self, k: &K) -> Result<bool, Error> {
        Ok(self.get(k)?.is_some())
    }

    /// Removes a key from the tree, returning the key-value pair if the key
    /// was previously set.
    pub fn delete(&mut self, k: &K) -> Result<Option<(K, V)>, Error> {
        self.root.remove_entry(k, self.store, self.bit_width)
    }

    /// Flush root and return Cid for the tree.
    pub fn flush(&mut self) -> Result<Cid, Error> {
        self.root.flush(self.store)?;
        Ok(self.store.put(&self.root, Code::Blake2b256)?)
    }

    /// Iterates over each KV in the tree and runs a function on the values.
    /// Iteration order is deterministic but unrelated to insertion order.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&K, &V) -> Result<(), Box<dyn StdError>>,
    {
        self.root.for_each(self.store, &mut f)
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
