// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod chain_store;
mod errors;
mod publisher;
mod tipset_tracker;

pub use self::chain_store::*;
pub use self::errors::*;
pub use self::publisher::*;
pub use self::tipset_tracker::*;
