// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod actor_state;
mod error;
mod exit_code;
mod method;
mod token;

pub use self::actor_state::*;
pub use self::error::*;
pub use self::exit_code::*;
pub use self::method::*;
pub use self::token::*;
