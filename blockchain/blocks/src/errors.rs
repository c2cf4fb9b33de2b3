// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Blockchain blocks error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The given tipset has no blocks.
    #[error("No blocks to create tipset")]
    NoBlocks,
    /// Blocks in the tipset are not all at the same height.
    #[error("Cannot create tipset, mismatching blocks heights")]
    MismatchingHeights,
    /// Blocks in the tipset do not share a parent set.
    #[error("Cannot create tipset, mismatching block parents")]
    MismatchingParents,
    /// A block past genesis carries no ticket.
    #[error("An optional ticket is not initialized")]
    TicketHasNoValue,
    /// Two blocks in the tipset carry an identical ticket.
    #[error("Duplicate tickets in tipset")]
    TicketsCollision,
    /// Derived tipset key does not match the expected key.
    #[error("Wrong order of blocks in tipset")]
    BlockOrderFailure,
    /// Tipset contains invalid data, as described by the string parameter.
    #[error("Invalid tipset: {0}")]
    InvalidTipset(String),
    /// Block could not be fetched from the store.
    #[error("Block store: {0}")]
    Store(String),
}

impl Error {
    /// Numeric category carried on the wire for tipset construction errors.
    pub fn wire_code(&self) -> Option<u8> {
        match self {
            Error::NoBlocks => Some(1),
            Error::MismatchingHeights => Some(2),
            Error::MismatchingParents => Some(3),
            Error::TicketHasNoValue => Some(4),
            Error::TicketsCollision => Some(5),
            Error::BlockOrderFailure => Some(6),
            _ => None,
        }
    }
}

impl From<arbor_blockstore::Error> for Error {
    fn from(e: arbor_blockstore::Error) -> Error {
        Error::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_carry_wire_codes() {
        assert_eq!(Error::NoBlocks.wire_code(), Some(1));
        assert_eq!(Error::MismatchingHeights.wire_code(), Some(2));
        assert_eq!(Error::MismatchingParents.wire_code(), Some(3));
        assert_eq!(Error::TicketHasNoValue.wire_code(), Some(4));
        assert_eq!(Error::TicketsCollision.wire_code(), Some(5));
        assert_eq!(Error::BlockOrderFailure.wire_code(), Some(6));
        assert_eq!(Error::InvalidTipset("x".to_string()).wire_code(), None);
    }
}
