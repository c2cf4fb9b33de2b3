// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Serialization error for any data that needs to be persisted or hashed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Failed to encode data: {0}")]
    Encoding(String),
    #[error("Failed to decode data: {0}")]
    Decoding(String),
}

impl From<Error> for String {
    fn from(e: Error) -> String {
        e.to_string()
    }
}
