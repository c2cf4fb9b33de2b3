// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_actor::INIT_ACTOR_ADDR;
use arbor_address::Address;
use arbor_blocks::{BlockHeader, Tipset, TxMeta};
use arbor_blockstore::{BlockStore, MemoryDB, Store};
use arbor_chain::{weight, ChainStore};
use arbor_encoding::Cbor;
use arbor_message::{Message, MessageReceipt, UnsignedMessage};
use arbor_state_manager::{
    ApplyRet, CidPair, Error, Interpreter, MessageWaiter, StateManager,
};
use arbor_test_utils::{
    construct_block, construct_block_with_messages, construct_genesis, empty_msg_meta,
    empty_receipts, register_account, tipset_of,
};
use arbor_vm::{ActorError, ExitCode, Serialized};
use cid::multihash::Code;
use cid::Cid;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Identity state transition: the state root is carried through unchanged
/// and every message receives an `Ok` receipt.
#[derive(Default)]
struct FixtureInterpreter {
    applies: AtomicUsize,
    fail_next: AtomicBool,
    abort_calls: AtomicBool,
}

impl Interpreter<MemoryDB> for FixtureInterpreter {
    fn apply_blocks(
        &self,
        db: &MemoryDB,
        tipset: &Tipset,
    ) -> Result<CidPair, Box<dyn StdError + Send + Sync>> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err("interpreter exploded".into());
        }

        let messages = arbor_chain::messages_for_tipset(db, tipset)?;
        let receipts: Vec<MessageReceipt> = messages
            .iter()
            .map(|_| MessageReceipt {
                exit_code: ExitCode::Ok,
                return_data: Serialized::default(),
                gas_used: 8,
            })
            .collect();
        let receipts_root = db.put(&receipts, Code::Blake2b256)?;
        Ok((*tipset.parent_state(), receipts_root))
    }

    fn apply_implicit_message(
        &self,
        _db: &MemoryDB,
        msg: &UnsignedMessage,
        _state_root: &Cid,
        _epoch: i64,
    ) -> Result<ApplyRet, Box<dyn StdError + Send + Sync>> {
        if self.abort_calls.load(Ordering::SeqCst) {
            return Ok(ApplyRet {
                msg_receipt: MessageReceipt {
                    exit_code: ExitCode::ErrNotFound,
                    return_data: Serialized::default(),
                    gas_used: 0,
                },
                act_error: Some(ActorError::new(
                    ExitCode::ErrNotFound,
                    "no such actor".to_string(),
                )),
            });
        }
        Ok(ApplyRet {
            msg_receipt: MessageReceipt {
                exit_code: ExitCode::Ok,
                return_data: msg.params().clone(),
                gas_used: 100,
            },
            act_error: None,
        })
    }
}

fn setup() -> (Arc<MemoryDB>, Arc<StateManager<MemoryDB>>, Arc<FixtureInterpreter>) {
    let db = Arc::new(MemoryDB::default());
    let genesis = construct_genesis(db.as_ref());
    let cs = Arc::new(ChainStore::new(db.clone(), &genesis).unwrap());
    cs.add_block(genesis).unwrap();
    let interpreter = Arc::new(FixtureInterpreter::default());
    let sm = Arc::new(StateManager::new(cs, interpreter.clone()));
    (db, sm, interpreter)
}

#[async_std::test]
async fn tipset_state_computes_once_per_key() {
    let (_db, sm, interpreter) = setup();
    let head = sm.chain_store().heaviest_tipset().unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let sm = sm.clone();
        let ts = head.clone();
        handles.push(async_std::task::spawn(async move {
            sm.tipset_state(&ts).await.unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await);
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(interpreter.applies.load(Ordering::SeqCst), 1);

    // a later call hits the cache as well
    sm.tipset_state(&head).await.unwrap();
    assert_eq!(interpreter.applies.load(Ordering::SeqCst), 1);
}

#[async_std::test]
async fn failed_computation_is_retried() {
    let (_db, sm, interpreter) = setup();
    let head = sm.chain_store().heaviest_tipset().unwrap();

    interpreter.fail_next.store(true, Ordering::SeqCst);
    assert!(sm.tipset_state(&head).await.is_err());

    // the failure was evicted, a retry recomputes and succeeds
    let pair = sm.tipset_state(&head).await.unwrap();
    assert_eq!(pair.0, *head.parent_state());
    assert_eq!(interpreter.applies.load(Ordering::SeqCst), 2);
}

#[test]
fn actor_reads_at_a_key_are_stable_across_head_updates() {
    let (db, sm, _) = setup();
    let gen_ts = sm.chain_store().heaviest_tipset().unwrap();

    let before = sm
        .get_actor_at(&INIT_ACTOR_ADDR, &gen_ts)
        .unwrap()
        .expect("init actor installed by fixture");

    // grow the chain underneath the reader
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();
    let blk = construct_block(db.as_ref(), &gen_ts, 1, b"t", w0);
    sm.chain_store().add_block(blk).unwrap();

    let after = sm
        .get_actor_at(&INIT_ACTOR_ADDR, &gen_ts)
        .unwrap()
        .expect("init actor still resolvable at the old key");
    assert_eq!(before.state, after.state);
    assert_eq!(before, after);
}

#[test]
fn call_returns_receipt_and_normalizes_aborts() {
    let (_db, sm, interpreter) = setup();

    let mut msg = UnsignedMessage::builder()
        .from(Address::new_id(100))
        .to(Address::new_id(101))
        .params(Serialized::new(vec![1, 2, 3]))
        .build()
        .unwrap();

    let ret = sm.call(&mut msg, None).unwrap();
    let receipt = ret.msg_rct.unwrap();
    assert_eq!(receipt.exit_code, ExitCode::Ok);
    assert_eq!(receipt.return_data.bytes(), &[1, 2, 3]);
    assert!(ret.error.is_none());
    // the default gas limit was applied before execution
    assert_eq!(ret.msg.gas_limit(), 10_000_000_000);

    interpreter.abort_calls.store(true, Ordering::SeqCst);
    let ret = sm.call(&mut msg, None).unwrap();
    assert_eq!(ret.msg_rct.unwrap().exit_code, ExitCode::ErrNotFound);
    assert!(ret.error.is_some());
}

#[test]
fn resolve_to_key_addr_follows_account_state() {
    let db = Arc::new(MemoryDB::default());
    // fixture genesis state, extended with one account actor
    let base_root = arbor_test_utils::construct_state(db.as_ref());
    let key_addr = Address::new_bls(&[9u8; arbor_address::BLS_PUB_LEN]).unwrap();
    let (root, id_addr) = register_account(db.as_ref(), &base_root, &key_addr);

    let genesis = BlockHeader::builder()
        .miner_address(Address::new_id(0))
        .epoch(0)
        .state_root(root)
        .message_receipts(empty_receipts(db.as_ref()))
        .messages(empty_msg_meta(db.as_ref()))
        .build_and_validate()
        .unwrap();
    let cs = Arc::new(ChainStore::new(db.clone(), &genesis).unwrap());
    cs.add_block(genesis).unwrap();
    let sm = StateManager::new(cs, Arc::new(FixtureInterpreter::default()));
    let head = sm.chain_store().heaviest_tipset().unwrap();

    // key form resolves to id form and back
    assert_eq!(sm.lookup_id(&key_addr, &head).unwrap(), Some(id_addr.clone()));
    assert_eq!(sm.resolve_to_key_addr(&id_addr, &head).unwrap(), key_addr);
    // key forms pass through unchanged
    assert_eq!(sm.resolve_to_key_addr(&key_addr, &head).unwrap(), key_addr);

    // every installed actor is listed
    let actors = sm.list_actors(&head).unwrap();
    assert!(actors.contains(&id_addr));
    assert!(actors.contains(&INIT_ACTOR_ADDR));
}

fn store_message<DB: BlockStore>(db: &DB, from: u64, to: u64, nonce: u64) -> (Cid, Cid) {
    let msg = UnsignedMessage::builder()
        .from(Address::new_id(from))
        .to(Address::new_id(to))
        .sequence(nonce)
        .build()
        .unwrap();
    let msg_cid = msg.cid().unwrap();
    db.write(msg_cid.to_bytes(), msg.marshal_cbor().unwrap())
        .unwrap();

    let bls_list = db.put(&vec![msg_cid], Code::Blake2b256).unwrap();
    let secp_list = db.put(&Vec::<Cid>::new(), Code::Blake2b256).unwrap();
    let meta = db
        .put(
            &TxMeta {
                bls_messages: bls_list,
                secp_messages: secp_list,
            },
            Code::Blake2b256,
        )
        .unwrap();
    (msg_cid, meta)
}

#[test]
fn list_messages_filters_and_walks_to_height() {
    let (db, sm, _) = setup();
    let gen_ts = sm.chain_store().heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    let (msg_cid, meta) = store_message(db.as_ref(), 100, 101, 0);
    let b1 = construct_block_with_messages(db.as_ref(), &gen_ts, 1, b"m1", w0, meta);
    sm.chain_store().add_block(b1.clone()).unwrap();
    let b1_ts = sm.chain_store().heaviest_tipset().unwrap();

    // the same message is carried again in the child block
    let w1 = weight(db.as_ref(), &b1_ts).unwrap();
    let b2 = construct_block_with_messages(db.as_ref(), &b1_ts, 1, b"m2", w1, *b1.messages());
    sm.chain_store().add_block(b2).unwrap();
    let head = sm.chain_store().heaviest_tipset().unwrap();

    // deduplication is per tipset: the walk reports the cid once per tipset
    let found = sm
        .list_messages(&head, Some(&Address::new_id(100)), None, 0)
        .unwrap();
    assert_eq!(found, vec![msg_cid, msg_cid]);

    // a walk stopping above the first block sees it once
    let found = sm
        .list_messages(&head, None, Some(&Address::new_id(101)), 2)
        .unwrap();
    assert_eq!(found, vec![msg_cid]);

    // non-matching filter returns nothing
    let found = sm
        .list_messages(&head, Some(&Address::new_id(55)), None, 0)
        .unwrap();
    assert!(found.is_empty());

    // a filterless query is rejected
    assert!(matches!(
        sm.list_messages(&head, None, None, 0),
        Err(Error::Other(_))
    ));
}

#[async_std::test]
async fn wait_for_message_resolves_on_apply() {
    let (db, sm, _) = setup();
    let waiter = MessageWaiter::spawn(sm.clone());
    let gen_ts = sm.chain_store().heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    let (msg_cid, meta) = store_message(db.as_ref(), 100, 101, 0);
    let pending = async_std::task::spawn(async move { waiter.wait(msg_cid).await });

    let blk = construct_block_with_messages(db.as_ref(), &gen_ts, 1, b"w", w0, meta);
    sm.chain_store().add_block(blk.clone()).unwrap();

    let (receipt, key) = pending.await.unwrap();
    assert_eq!(receipt.exit_code, ExitCode::Ok);
    assert_eq!(key, tipset_of(&blk).key().clone());
}
