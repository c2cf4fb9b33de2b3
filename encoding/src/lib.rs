// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod bytes;
mod cbor;
mod errors;
mod hash;

#[cfg(feature = "json")]
pub mod json;

pub use self::bytes::*;
pub use self::cbor::*;
pub use self::errors::*;
pub use self::hash::*;

pub use serde::{de, ser};
pub use serde_bytes;
pub use serde_cbor::{from_slice, to_vec};

/// Multicodec identifier for dag-cbor encoded blocks.
pub const DAG_CBOR: u64 = 0x71;

/// Multicodec identifier for raw blocks.
pub const IPLD_RAW: u64 = 0x55;

pub mod tuple {
    pub use serde_tuple::{self, Deserialize_tuple, Serialize_tuple};
}
