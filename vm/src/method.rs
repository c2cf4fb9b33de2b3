// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_encoding::{de::DeserializeOwned, from_slice, to_vec, ser::Serialize as SerSerialize, Error as EncodingError};
use serde::{Deserialize, Serialize};

/// Method number indicator for calling actor methods.
pub type MethodNum = u64;

/// Base actor send method.
pub const METHOD_SEND: MethodNum = 0;
/// Base actor constructor method.
pub const METHOD_CONSTRUCTOR: MethodNum = 1;

/// Serialized bytes to be used as parameters or return values for actor
/// method calls.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serialized {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
}

impl Serialized {
    /// Constructor if data is encoded already.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Contructor for encoding CBOR encodable structure.
    pub fn serialize<O: SerSerialize>(obj: O) -> Result<Self, EncodingError> {
        Ok(Self {
            bytes: to_vec(&obj).map_err(|e| EncodingError::Encoding(e.to_string()))?,
        })
    }

    /// Returns serialized bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Deserializes the serialized bytes into a defined type.
    pub fn deserialize<O: DeserializeOwned>(&self) -> Result<O, EncodingError> {
        from_slice(&self.bytes).map_err(|e| EncodingError::Decoding(e.to_string()))
    }
}
