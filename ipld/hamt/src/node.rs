// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::bitfield::Bitfield;
use super::hash_bits::{hash_key, HashBits};
use super::pointer::Pointer;
use super::{Error, KeyValuePair, MAX_ARRAY_WIDTH};
use arbor_blockstore::BlockStore;
use cid::multihash::Code;
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error as StdError;

/// Single level of the tree: an occupancy bitfield and the compressed vector
/// of child pointers for the set bits.
#[derive(Debug, PartialEq)]
pub(crate) struct Node<K, V> {
    pub(crate) bitfield: Bitfield,
    pub(crate) pointers: Vec<Pointer<K, V>>,
}

impl<K, V> Serialize for Node<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.bitfield, &self.pointers).serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for Node<K, V>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bitfield, pointers) = Deserialize::deserialize(deserializer)?;
        Ok(Node { bitfield, pointers })
    }
}

impl<K, V> Default for Node<K, V> {
    fn default() -> Self {
        Node {
            bitfield: Bitfield::zero(),
            pointers: Vec::new(),
        }
    }
}

impl<K, V> Node<K, V>
where
    K: Eq + PartialOrd + AsRef<[u8]> + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    pub fn set<S: BlockStore>(
        &mut self,
        key: K,
        value: V,
        store: &S,
        bit_width: u32,
    ) -> Result<Option<V>, Error> {
        let hash = hash_key(key.as_ref());
        self.modify_value(&mut HashBits::new(&hash), bit_width, key, value, store)
    }

    #[inline]
    pub fn get<'a, S: BlockStore>(
        &'a self,
        key: &K,
        store: &S,
        bit_width: u32,
    ) -> Result<Option<&'a V>, Error> {
        let hash = hash_key(key.as_ref());
        Ok(self
            .get_value(&mut HashBits::new(&hash), bit_width, key, store)?
            .map(|kv| kv.value()))
    }

    #[inline]
    pub fn remove_entry<S: BlockStore>(
        &mut self,
        key: &K,
        store: &S,
        bit_width: u32,
    ) -> Result<Option<(K, V)>, Error> {
        let hash = hash_key(key.as_ref());
        self.rm_value(&mut HashBits::new(&hash), bit_width, key, store)
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    fn get_value<'a, S: BlockStore>(
        &'a self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: &K,
        store: &S,
    ) -> Result<Option<&'a KeyValuePair<K, V>>, Error> {
        let idx = hashed_key.next(bit_width)?;
        if !self.bitfield.test_bit(idx) {
            return Ok(None);
        }

        let cindex = self.bitfield.index_below(idx);
        match &self.pointers[cindex] {
            Pointer::Values(vals) => Ok(vals.iter().find(|kv| kv.key() == key)),
            pointer => pointer
                .load_child(store)?
                .get_value(hashed_key, bit_width, key, store),
        }
    }

    fn modify_value<S: BlockStore>(
        &mut self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: K,
        value: V,
        store: &S,
    ) -> Result<Option<V>, Error> {
        let idx = hashed_key.next(bit_width)?;

        // No existing values at this index.
        if !self.bitfield.test_bit(idx) {
            self.insert_child(idx, key, value);
            return Ok(None);
        }

        let cindex = self.bitfield.index_below(idx);
        let child = &mut self.pointers[cindex];

        match child {
            Pointer::Link { cid, cache } => {
                cache.get_or_try_init(|| {
                    store
                        .get::<Node<K, V>>(cid)?
                        .map(Box::new)
                        .ok_or_else(|| Error::CidNotFound(cid.to_string()))
                })?;
                let mut child_node = cache.take().expect("filled above");
                let v = child_node.modify_value(hashed_key, bit_width, key, value, store)?;
                *child = Pointer::Dirty(child_node);
                Ok(v)
            }
            Pointer::Dirty(node) => node.modify_value(hashed_key, bit_width, key, value, store),
            Pointer::Values(vals) => {
                // Update, if the key already exists.
                if let Some(i) = vals.iter().position(|kv| kv.key() == &key) {
                    let old = std::mem::replace(&mut vals[i].1, value);
                    return Ok(Some(old));
                }

                // If the array is full, create a subshard and insert everything
                if vals.len() >= MAX_ARRAY_WIDTH {
                    let consumed = hashed_key.consumed;
                    let mut sub = Node::<K, V>::default();
                    sub.modify_value(hashed_key, bit_width, key, value, store)?;
                    for p in std::mem::take(vals).into_iter() {
                        let hash = hash_key(p.0.as_ref());
                        sub.modify_value(
                            &mut HashBits::new_at_index(&hash, consumed),
                            bit_width,
                            p.0,
                            p.1,
                            store,
                        )?;
                    }
                    *child = Pointer::Dirty(Box::new(sub));
                    return Ok(None);
                }

                // Otherwise insert the element into the array in order.
                let max = vals.len();
                let idx = vals.iter().position(|c| c.key() > &key).unwrap_or(max);
                vals.insert(idx, KeyValuePair::new(key, value));
                Ok(None)
            }
        }
    }

    fn rm_value<S: BlockStore>(
        &mut self,
        hashed_key: &mut HashBits,
        bit_width: u32,
        key: &K,
        store: &S,
    ) -> Result<Option<(K, V)>, Error> {
        let idx = hashed_key.next(bit_width)?;
        if !self.bitfield.test_bit(idx) {
            return Ok(None);
        }

        let cindex = self.bitfield.index_below(idx);

        if matches!(&self.pointers[cindex], Pointer::Values(_)) {
            let (pos, is_last) = match &self.pointers[cindex] {
                Pointer::Values(vals) => (
                    vals.iter().position(|kv| kv.key() == key),
                    vals.len() == 1,
                ),
                _ => unreachable!(),
            };
            return match pos {
                None => Ok(None),
                Some(_) if is_last => {
                    // Last entry at this slot, drop the pointer entirely.
                    match self.rm_child(cindex, idx) {
                        Pointer::Values(mut vals) => {
                            let kv = vals.remove(0);
                            Ok(Some((kv.0, kv.1)))
                        }
                        _ => unreachable!(),
                    }
                }
                Some(i) => match &mut self.pointers[cindex] {
                    Pointer::Values(vals) => {
                        let kv = vals.remove(i);
                        Ok(Some((kv.0, kv.1)))
                    }
                    _ => unreachable!(),
                },
            };
        }

        let child = &mut self.pointers[cindex];
        match child {
            Pointer::Link { cid, cache } => {
                cache.get_or_try_init(|| {
                    store
                        .get::<Node<K, V>>(cid)?
                        .map(Box::new)
                        .ok_or_else(|| Error::CidNotFound(cid.to_string()))
                })?;
                let mut child_node = cache.take().expect("filled above");
                let v = child_node.rm_value(hashed_key, bit_width, key, store)?;
                *child = Pointer::Dirty(child_node);
                // Ensure the tree looks correct after the deletion
                child.clean()?;
                Ok(v)
            }
            Pointer::Dirty(node) => {
                let v = node.rm_value(hashed_key, bit_width, key, store)?;
                child.clean()?;
                Ok(v)
            }
            Pointer::Values(_) => unreachable!(),
        }
    }

    pub fn flush<S: BlockStore>(&mut self, store: &S) -> Result<(), Error> {
        for pointer in &mut self.pointers {
            if let Pointer::Dirty(node) = pointer {
                node.flush(store)?;
                let cid = store.put(node.as_ref(), Code::Blake2b256)?;
                let cache = OnceCell::new();
                let _ = cache.set(std::mem::take(node));
                *pointer = Pointer::Link { cid, cache };
            }
        }
        Ok(())
    }

    pub fn for_each<S, F>(&self, store: &S, f: &mut F) -> Result<(), Error>
    where
        S: BlockStore,
        F: FnMut(&K, &V) -> Result<(), Box<dyn StdError>>,
    {
        for p in &self.pointers {
            match p {
                Pointer::Values(vals) => {
                    for kv in vals {
                        f(kv.key(), kv.value()).map_err(|e| Error::Dynamic(e.to_string()))?;
                    }
                }
                pointer => pointer.load_child(store)?.for_each(store, f)?,
            }
        }
        Ok(())
    }

    fn insert_child(&mut self, idx: u32, key: K, value: V) {
        let i = self.bitfield.index_below(idx);
        self.bitfield.set_bit(idx);
        self.pointers.insert(i, Pointer::from_key_value(key, value))
    }

    fn rm_child(&mut self, cindex: usize, idx: u32) -> Pointer<K, V> {
        self.bitfield.clear_bit(idx);
        self.pointers.remove(cindex)
    }
}
