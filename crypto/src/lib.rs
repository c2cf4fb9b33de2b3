// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod randomness;
mod signature;
mod vrf;

pub use self::randomness::*;
pub use self::signature::*;
pub use self::vrf::*;
