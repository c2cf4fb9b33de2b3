// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Chain store error
#[derive(Debug, Error)]
pub enum Error {
    /// Key was not found in the store.
    #[error("Invalid key: {0}")]
    UndefinedKey(String),
    /// Error originating from a tipset or block header.
    #[error("Invalid blockchain: {0}")]
    Blockchain(#[from] arbor_blocks::Error),
    /// Error originating from the content-addressed store.
    #[error("Blockstore: {0}")]
    Blockstore(String),
    /// Error originating from state.
    #[error("Invalid state: {0}")]
    State(String),
    #[error(transparent)]
    Encoding(#[from] arbor_encoding::Error),
    #[error("{0}")]
    Other(String),
}

impl From<arbor_blockstore::Error> for Error {
    fn from(e: arbor_blockstore::Error) -> Error {
        Error::Blockstore(e.to_string())
    }
}

impl From<Box<dyn std::error::Error>> for Error {
    fn from(e: Box<dyn std::error::Error>) -> Error {
        Error::State(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Error {
        Error::Other(e)
    }
}
