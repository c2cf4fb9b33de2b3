// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod memory;

pub use self::errors::Error;
pub use self::memory::MemoryDB;

use arbor_encoding::{from_slice, to_vec, ser::Serialize, DAG_CBOR, IPLD_RAW};
use cid::multihash::{Code, MultihashDigest};
use cid::Cid;
use serde::de::DeserializeOwned;

/// Raw key-value store contract backing a blockstore. Implementations must
/// be safe for concurrent readers and writers.
pub trait Store {
    /// Read single value from data store and return `None` if key doesn't exist.
    fn read<K>(&self, key: K) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>;

    /// Write a single value to the data store.
    fn write<K, V>(&self, key: K, value: V) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>;

    /// Returns `Ok(true)` if key exists in store.
    fn exists<K>(&self, key: K) -> Result<bool, Error>
    where
        K: AsRef<[u8]>;

    /// Delete value at key.
    fn delete<K>(&self, key: K) -> Result<(), Error>
    where
        K: AsRef<[u8]>;

    /// Write slice of KV pairs.
    fn bulk_write<K, V>(&self, values: &[(K, V)]) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        for (k, v) in values {
            self.write(k, v)?;
        }
        Ok(())
    }
}

/// Wrapper for database to handle inserting and retrieving ipld data with Cids.
pub trait BlockStore: Store {
    /// Get bytes from block store by Cid.
    fn get_bytes(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Error> {
        self.read(cid.to_bytes())
    }

    /// Get typed object from block store by Cid.
    fn get<T>(&self, cid: &Cid) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        match self.get_bytes(cid)? {
            Some(bz) => Ok(Some(
                from_slice(&bz)
                    .map_err(|e| arbor_encoding::Error::Decoding(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Put an object in the block store and return the Cid identifier.
    fn put<S>(&self, obj: &S, code: Code) -> Result<Cid, Error>
    where
        S: Serialize,
    {
        let bytes =
            to_vec(obj).map_err(|e| arbor_encoding::Error::Encoding(e.to_string()))?;
        let cid = Cid::new_v1(DAG_CBOR, code.digest(&bytes));
        self.write(cid.to_bytes(), &bytes)?;
        Ok(cid)
    }

    /// Put raw bytes in the block store and return the Cid identifier.
    fn put_raw(&self, bytes: Vec<u8>, code: Code) -> Result<Cid, Error> {
        let cid = Cid::new_v1(IPLD_RAW, code.digest(&bytes));
        self.write(cid.to_bytes(), &bytes)?;
        Ok(cid)
    }
}

impl<T: Store> BlockStore for T {}
