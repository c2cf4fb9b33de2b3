// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#[macro_use]
extern crate lazy_static;

pub mod account;
pub mod init;
pub mod power;

use arbor_address::Address;
use arbor_encoding::IPLD_RAW;
use cid::multihash::{Code, MultihashDigest};
use cid::Cid;

lazy_static! {
    /// System actor address.
    pub static ref SYSTEM_ACTOR_ADDR: Address = Address::new_id(0);
    /// Init actor address, owner of the address map.
    pub static ref INIT_ACTOR_ADDR: Address = Address::new_id(1);
    /// Storage power actor address.
    pub static ref STORAGE_POWER_ACTOR_ADDR: Address = Address::new_id(4);

    /// Identifier of the system actor class.
    pub static ref SYSTEM_ACTOR_CODE_ID: Cid = make_builtin(b"arbor/1/system");
    /// Identifier of the init actor class.
    pub static ref INIT_ACTOR_CODE_ID: Cid = make_builtin(b"arbor/1/init");
    /// Identifier of the storage power actor class.
    pub static ref POWER_ACTOR_CODE_ID: Cid = make_builtin(b"arbor/1/storagepower");
    /// Identifier of the account actor class.
    pub static ref ACCOUNT_ACTOR_CODE_ID: Cid = make_builtin(b"arbor/1/account");
}

fn make_builtin(bz: &[u8]) -> Cid {
    Cid::new_v1(IPLD_RAW, Code::Identity.digest(bz))
}
