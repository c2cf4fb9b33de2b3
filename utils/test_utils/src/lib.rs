// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Fixture builders shared by the chain core integration tests: a minimal
//! genesis state with the system actors installed, and header constructors
//! for growing test chains block by block.

use arbor_actor::{
    account, init, power, ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_CODE_ID, POWER_ACTOR_CODE_ID,
    SYSTEM_ACTOR_CODE_ID, INIT_ACTOR_ADDR, STORAGE_POWER_ACTOR_ADDR, SYSTEM_ACTOR_ADDR,
};
use arbor_address::Address;
use arbor_bigint::BigInt;
use arbor_blocks::{BlockHeader, Ticket, Tipset, TipsetKeys, TxMeta};
use arbor_blockstore::BlockStore;
use arbor_crypto::VRFProof;
use arbor_message::MessageReceipt;
use arbor_state_tree::StateTree;
use arbor_vm::ActorState;
use cid::multihash::Code;
use cid::Cid;

/// Quality-adjusted power installed in the fixture power actor; enough that
/// the weight function's log2 term is meaningfully non-zero.
pub const FIXTURE_POWER: u64 = 1 << 30;

fn actor(code: Cid, state: Cid) -> ActorState {
    ActorState::new(code, state, BigInt::from(0u8), 0)
}

/// Builds a state tree holding the system, init and power actors and
/// returns its flushed root.
pub fn construct_state<DB: BlockStore>(db: &DB) -> Cid {
    let mut tree = StateTree::new(db);

    let sys_head = db.put(&(), Code::Blake2b256).unwrap();
    tree.set_actor(&SYSTEM_ACTOR_ADDR, actor(*SYSTEM_ACTOR_CODE_ID, sys_head))
        .unwrap();

    let init_state = init::State::new(db, "arbor-test".to_string()).unwrap();
    let init_head = db.put(&init_state, Code::Blake2b256).unwrap();
    tree.set_actor(&INIT_ACTOR_ADDR, actor(*INIT_ACTOR_CODE_ID, init_head))
        .unwrap();

    let power_state = power::State::new(BigInt::from(FIXTURE_POWER), BigInt::from(FIXTURE_POWER));
    let power_head = db.put(&power_state, Code::Blake2b256).unwrap();
    tree.set_actor(
        &STORAGE_POWER_ACTOR_ADDR,
        actor(*POWER_ACTOR_CODE_ID, power_head),
    )
    .unwrap();

    tree.flush().unwrap()
}

/// Installs an account actor for the given key address and returns the new
/// state root and the assigned ID address.
pub fn register_account<DB: BlockStore>(db: &DB, root: &Cid, key: &Address) -> (Cid, Address) {
    let mut tree = StateTree::new_from_root(db, root).unwrap();
    let id = tree.register_new_address(key).unwrap();
    let head = db
        .put(&account::State {
            address: key.clone(),
        }, Code::Blake2b256)
        .unwrap();
    tree.set_actor(&id, actor(*ACCOUNT_ACTOR_CODE_ID, head))
        .unwrap();
    let root = tree.flush().unwrap();
    (root, id)
}

/// Empty bls/secp message meta, stored in the db.
pub fn empty_msg_meta<DB: BlockStore>(db: &DB) -> Cid {
    let empty_list = db.put(&Vec::<Cid>::new(), Code::Blake2b256).unwrap();
    db.put(
        &TxMeta {
            bls_messages: empty_list,
            secp_messages: empty_list,
        },
        Code::Blake2b256,
    )
    .unwrap()
}

/// Empty receipts list, stored in the db.
pub fn empty_receipts<DB: BlockStore>(db: &DB) -> Cid {
    db.put(&Vec::<MessageReceipt>::new(), Code::Blake2b256)
        .unwrap()
}

/// Builds the genesis header over a fixture state, persisting everything the
/// header links to.
pub fn construct_genesis<DB: BlockStore>(db: &DB) -> BlockHeader {
    let state_root = construct_state(db);
    BlockHeader::builder()
        .miner_address(Address::new_id(0))
        .epoch(0)
        .state_root(state_root)
        .message_receipts(empty_receipts(db))
        .messages(empty_msg_meta(db))
        .timestamp(7777)
        .build_and_validate()
        .unwrap()
}

/// Builds a child block of `parent` mined by `miner` with the given ticket
/// bytes. `parent_weight` is the weight the consensus layer computed for the
/// parent tipset.
pub fn construct_block<DB: BlockStore>(
    db: &DB,
    parent: &Tipset,
    miner: u64,
    ticket_bytes: &[u8],
    parent_weight: BigInt,
) -> BlockHeader {
    construct_block_with_messages(db, parent, miner, ticket_bytes, parent_weight, empty_msg_meta(db))
}

/// As [`construct_block`], with an explicit message meta cid.
pub fn construct_block_with_messages<DB: BlockStore>(
    db: &DB,
    parent: &Tipset,
    miner: u64,
    ticket_bytes: &[u8],
    parent_weight: BigInt,
    messages: Cid,
) -> BlockHeader {
    BlockHeader::builder()
        .miner_address(Address::new_id(miner))
        .epoch(parent.epoch() + 1)
        .parents(parent.key().clone())
        .weight(parent_weight)
        // The fixture interpreter is the identity: executing any tipset
        // leaves the state root and receipts unchanged.
        .state_root(*parent.parent_state())
        .message_receipts(*parent.parent_receipts())
        .messages(messages)
        .ticket(Some(Ticket::new(VRFProof::new(ticket_bytes.to_vec()))))
        .timestamp(parent.min_timestamp() + 30)
        .build_and_validate()
        .unwrap()
}

/// Shorthand for a single-block tipset around a header.
pub fn tipset_of(header: &BlockHeader) -> Tipset {
    Tipset::new(vec![header.clone()]).unwrap()
}

/// Key for a list of headers, in canonical order.
pub fn keys_of(headers: &[&BlockHeader]) -> TipsetKeys {
    Tipset::new(headers.iter().map(|h| (*h).clone()).collect())
        .unwrap()
        .key()
        .clone()
}
