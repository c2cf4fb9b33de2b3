// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_address::Address;
use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;

/// State of an account actor: the key address the account was created for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub address: Address,
}

impl Cbor for State {}

impl State {
    pub fn pubkey_address(&self) -> &Address {
        &self.address
    }
}
