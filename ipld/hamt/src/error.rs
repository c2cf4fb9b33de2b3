// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// HAMT error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Maximum depth of the tree reached, the hash is exhausted.
    #[error("Maximum depth reached")]
    MaxDepth,
    /// A linked node was not found in the store.
    #[error("Cid ({0}) did not match any in the store")]
    CidNotFound(String),
    #[error(transparent)]
    Encoding(#[from] arbor_encoding::Error),
    #[error("Blockstore: {0}")]
    Blockstore(String),
    #[error("{0}")]
    Dynamic(String),
}

impl From<arbor_blockstore::Error> for Error {
    fn from(e: arbor_blockstore::Error) -> Error {
        Error::Blockstore(e.to_string())
    }
}

impl From<Error> for String {
    fn from(e: Error) -> String {
        e.to_string()
    }
}
