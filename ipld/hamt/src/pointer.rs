// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::node::Node;
use super::{Error, KeyValuePair, MAX_ARRAY_WIDTH};
use arbor_blockstore::BlockStore;
use cid::Cid;
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Child slot of a node: either inline key-value entries or a link to a
/// sharded child node. Dirty children exist only between a mutation and the
/// next `flush`.
#[derive(Debug)]
pub(crate) enum Pointer<K, V> {
    Values(Vec<KeyValuePair<K, V>>),
    Link {
        cid: Cid,
        cache: OnceCell<Box<Node<K, V>>>,
    },
    Dirty(Box<Node<K, V>>),
}

impl<K: PartialEq, V: PartialEq> PartialEq for Pointer<K, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pointer::Values(a), Pointer::Values(b)) => a == b,
            (Pointer::Link { cid: a, .. }, Pointer::Link { cid: b, .. }) => a == b,
            (Pointer::Dirty(a), Pointer::Dirty(b)) => a == b,
            _ => false,
        }
    }
}

impl<K, V> Serialize for Pointer<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Pointer::Values(vals) => (None::<Cid>, vals).serialize(serializer),
            Pointer::Link { cid, .. } => {
                (Some(cid), Vec::<KeyValuePair<K, V>>::new()).serialize(serializer)
            }
            Pointer::Dirty(_) => Err(serde::ser::Error::custom(
                "Cannot serialize a dirty node, flush first",
            )),
        }
    }
}

impl<'de, K, V> Deserialize<'de> for Pointer<K, V>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (link, vals): (Option<Cid>, Vec<KeyValuePair<K, V>>) =
            Deserialize::deserialize(deserializer)?;
        match link {
            Some(cid) => Ok(Pointer::Link {
                cid,
                cache: Default::default(),
            }),
            None => Ok(Pointer::Values(vals)),
        }
    }
}

impl<K, V> Pointer<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    pub(crate) fn from_key_value(key: K, value: V) -> Self {
        Pointer::Values(vec![KeyValuePair::new(key, value)])
    }

    /// Loads the child node behind a link, caching the result.
    pub(crate) fn load_child<'a, S: BlockStore>(
        &'a self,
        store: &S,
    ) -> Result<&'a Node<K, V>, Error> {
        match self {
            Pointer::Link { cid, cache } => {
                let node = cache.get_or_try_init(|| {
                    store
                        .get::<Node<K, V>>(cid)?
                        .map(Box::new)
                        .ok_or_else(|| Error::CidNotFound(cid.to_string()))
                })?;
                Ok(node)
            }
            Pointer::Dirty(node) => Ok(node),
            Pointer::Values(_) => Err(Error::Dynamic(
                "Tried to load a child from a leaf pointer".to_string(),
            )),
        }
    }

    /// Internal method to cleanup children, to ensure consistent tree
    /// representation after deletes.
    pub(crate) fn clean(&mut self) -> Result<(), Error> {
        if let Pointer::Dirty(node) = self {
            if node.pointers.len() == 1 {
                if let Pointer::Values(vals) = &mut node.pointers[0] {
                    if vals.len() <= MAX_ARRAY_WIDTH {
                        let vals = std::mem::take(vals);
                        *self = Pointer::Values(vals);
                    }
                }
            }
        }
        Ok(())
    }
}

