// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod bitfield;
mod error;
mod hamt;
mod hash_bits;
mod node;
mod pointer;

pub use self::error::Error;
pub use self::hamt::Hamt;

pub(crate) use self::bitfield::Bitfield;
pub(crate) use self::hash_bits::HashBits;
pub(crate) use self::node::Node;
pub(crate) use self::pointer::Pointer;

use serde::{Deserialize, Serialize};

/// Default bit width of the tree, yielding 256-wide nodes.
pub const DEFAULT_BIT_WIDTH: u32 = 8;

/// Max number of entries kept inline in a leaf before it is sharded.
pub(crate) const MAX_ARRAY_WIDTH: usize = 3;

/// Sha-256 digest of a key, consumed `bit_width` bits at a time per level.
pub type HashedKey = [u8; 32];

/// Key type of the map as stored on chain: opaque bytes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct BytesKey(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl AsRef<[u8]> for BytesKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for BytesKey {
    fn from(bz: Vec<u8>) -> Self {
        BytesKey(bz)
    }
}

impl From<&[u8]> for BytesKey {
    fn from(s: &[u8]) -> Self {
        Self(s.to_vec())
    }
}

/// Key value pair stored in a leaf.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct KeyValuePair<K, V>(pub K, pub V);

impl<K, V> KeyValuePair<K, V> {
    pub fn key(&self) -> &K {
        &self.0
    }
    pub fn value(&self) -> &V {
        &self.1
    }
    pub fn new(key: K, value: V) -> Self {
        KeyValuePair(key, value)
    }
}
