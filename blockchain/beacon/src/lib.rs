// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod beacon_entries;

pub use self::beacon_entries::*;
