// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod block;
mod errors;

pub mod election_proof;
pub mod header;
pub mod ticket;
pub mod tipset;

pub use self::block::*;
pub use self::election_proof::ElectionProof;
pub use self::errors::*;
pub use self::header::{BlockHeader, BlockHeaderBuilder};
pub use self::ticket::Ticket;
pub use self::tipset::{FullTipset, Tipset, TipsetKeys};
