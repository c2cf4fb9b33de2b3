// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Blockstore error. Missing entries surface as `Ok(None)` from reads, not
/// as an error; the variants here are decode failures and backend faults.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] arbor_encoding::Error),
    #[error("{0}")]
    Other(String),
}

impl From<Error> for String {
    fn from(e: Error) -> String {
        e.to_string()
    }
}
