// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// 256-bit occupancy map for a node, one bit per possible child index.
/// Serialized as minimal big-endian bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bitfield([u64; 4]);

impl Bitfield {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn test_bit(&self, idx: u32) -> bool {
        debug_assert!(idx < 256);
        self.0[(idx / 64) as usize] & (1u64 << (idx % 64)) != 0
    }

    pub fn set_bit(&mut self, idx: u32) {
        debug_assert!(idx < 256);
        self.0[(idx / 64) as usize] |= 1u64 << (idx % 64);
    }

    pub fn clear_bit(&mut self, idx: u32) {
        debug_assert!(idx < 256);
        self.0[(idx / 64) as usize] &= !(1u64 << (idx % 64));
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of set bits strictly below `idx`; the compressed pointer index.
    pub fn index_below(&self, idx: u32) -> usize {
        debug_assert!(idx < 256);
        let word = (idx / 64) as usize;
        let mut count = 0usize;
        for w in 0..word {
            count += self.0[w].count_ones() as usize;
        }
        let mask = (1u64 << (idx % 64)) - 1;
        count + (self.0[word] & mask).count_ones() as usize
    }
}

impl Serialize for Bitfield {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().rev().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.to_be_bytes());
        }
        // Minimal encoding, strip leading zero bytes
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(32);
        serde_bytes::Serialize::serialize(&bytes[first..], serializer)
    }
}

impl<'de> Deserialize<'de> for Bitfield {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bz: Vec<u8> = serde_bytes::Deserialize::deserialize(deserializer)?;
        if bz.len() > 32 {
            return Err(serde::de::Error::custom(
                "bitfield larger than 32 bytes",
            ));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - bz.len()..].copy_from_slice(&bz);

        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().rev().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_be_bytes(buf);
        }
        Ok(Bitfield(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_ops() {
        let mut bf = Bitfield::zero();
        bf.set_bit(0);
        bf.set_bit(7);
        bf.set_bit(200);
        assert!(bf.test_bit(0) && bf.test_bit(7) && bf.test_bit(200));
        assert!(!bf.test_bit(8));
        assert_eq!(bf.count_ones(), 3);
        assert_eq!(bf.index_below(0), 0);
        assert_eq!(bf.index_below(7), 1);
        assert_eq!(bf.index_below(201), 3);
        bf.clear_bit(7);
        assert!(!bf.test_bit(7));
        assert_eq!(bf.count_ones(), 2);
    }

    #[test]
    fn symmetric_serialization() {
        let mut bf = Bitfield::zero();
        bf.set_bit(3);
        bf.set_bit(64);
        bf.set_bit(255);
        let bz = serde_cbor::to_vec(&bf).unwrap();
        let back: Bitfield = serde_cbor::from_slice(&bz).unwrap();
        assert_eq!(back, bf);
    }
}
