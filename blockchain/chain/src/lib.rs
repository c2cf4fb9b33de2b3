// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod store;
mod weight;

pub use self::store::*;
pub use self::weight::*;
