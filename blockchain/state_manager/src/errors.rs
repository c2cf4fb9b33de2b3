// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// State manager error
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the state of an actor.
    #[error("Actor for address: {0} does not exist")]
    ActorNotFound(String),
    /// Actor state is missing from the store.
    #[error("Actor state not found at cid: {0}")]
    ActorStateNotFound(String),
    /// Error originating from the state tree.
    #[error("{0}")]
    State(String),
    #[error(transparent)]
    Chain(#[from] arbor_chain::Error),
    #[error("Blockstore: {0}")]
    Blockstore(String),
    #[error(transparent)]
    Encoding(#[from] arbor_encoding::Error),
    /// Any other error that does not fit the categories above.
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
