// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::errors::Error;
use cid::multihash::{Code, MultihashDigest};
use cid::Cid;
use serde::{de::DeserializeOwned, Serialize};

/// Marker trait for types with a canonical CBOR representation.
///
/// Everything persisted in the content-addressed store implements this; the
/// bytes produced by `marshal_cbor` are what the value's [`Cid`] commits to.
pub trait Cbor: Serialize + DeserializeOwned {
    /// Serialize into canonical CBOR bytes.
    fn marshal_cbor(&self) -> Result<Vec<u8>, Error> {
        serde_cbor::to_vec(self).map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Deserialize from CBOR bytes.
    fn unmarshal_cbor(bz: &[u8]) -> Result<Self, Error> {
        serde_cbor::from_slice(bz).map_err(|e| Error::Decoding(e.to_string()))
    }

    /// Content identifier of the canonical serialization.
    fn cid(&self) -> Result<Cid, Error> {
        Ok(Cid::new_v1(
            crate::DAG_CBOR,
            Code::Blake2b256.digest(&self.marshal_cbor()?),
        ))
    }
}
