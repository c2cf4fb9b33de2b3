// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, HashedKey};
use sha2::{Digest, Sha256};

/// Hashes the raw bytes of a key into the fixed digest consumed level by level.
pub fn hash_key(key: &[u8]) -> HashedKey {
    let digest = Sha256::digest(key);
    let mut hash = HashedKey::default();
    hash.copy_from_slice(&digest);
    hash
}

/// Helper struct which indexes and allows returning bits from a hashed key.
#[derive(Debug, Clone, Copy)]
pub struct HashBits<'a> {
    b: &'a HashedKey,
    pub(crate) consumed: u32,
}

fn mkmask(n: u32) -> u32 {
    ((1u64 << n) - 1) as u32
}

impl<'a> HashBits<'a> {
    pub fn new(hash: &'a HashedKey) -> Self {
        Self::new_at_index(hash, 0)
    }

    /// Constructs hash bits with custom consumed index.
    pub fn new_at_index(hash: &'a HashedKey, consumed: u32) -> Self {
        Self { b: hash, consumed }
    }

    /// Returns next `i` bits of the hash and returns the value as an integer,
    /// erroring when the hash is exhausted.
    pub fn next(&mut self, i: u32) -> Result<u32, Error> {
        debug_assert!(i <= 8);
        if self.consumed + i > self.b.len() as u32 * 8 {
            return Err(Error::MaxDepth);
        }
        Ok(self.next_bits(i))
    }

    fn next_bits(&mut self, i: u32) -> u32 {
        let curbi = self.consumed / 8;
        let leftb = 8 - (self.consumed % 8);

        let curb = self.b[curbi as usize] as u32;
        match i.cmp(&leftb) {
            std::cmp::Ordering::Equal => {
                // bits to consume is equal to the bits remaining in the currently indexed byte
                let out = mkmask(i) & curb;
                self.consumed += i;
                out
            }
            std::cmp::Ordering::Less => {
                // Consuming less than the remaining bits in the current byte
                let a = curb & mkmask(leftb);
                let b = a & !mkmask(leftb - i);
                let c = b >> (leftb - i);
                self.consumed += i;
                c
            }
            std::cmp::Ordering::Greater => {
                // Consumes remaining bits and remaining bits from a recursive call
                let mut out = (mkmask(leftb) & curb) as u64;
                out <<= i - leftb;
                out += self.next_bits(i - leftb) as u64;
                out as u32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bits_uint() {
        let mut hash: HashedKey = Default::default();
        hash[0] = 0b1000_1000;
        hash[1] = 0b1010_1010;
        let mut hb = HashBits::new(&hash);
        // Test eq cmp
        assert_eq!(hb.next(8).unwrap(), 0b1000_1000);
        // Test lt cmp
        assert_eq!(hb.next(5).unwrap(), 0b10101);
        // Test gt cmp
        hash[2] = 0b1011_0111;
        let mut hb = HashBits::new_at_index(&hash, 13);
        assert_eq!(hb.next(6).unwrap(), 0b010_101);

        let mut hb = HashBits::new_at_index(&hash, 32 * 8 - 3);
        assert_eq!(hb.next(3).unwrap(), 0);
        assert!(hb.next(1).is_err());
    }
}
