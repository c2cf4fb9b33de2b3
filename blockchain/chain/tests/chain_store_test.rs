// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_beacon::BeaconEntry;
use arbor_blocks::{BlockHeader, Error as BlocksError, Tipset, TipsetKeys};
use arbor_blockstore::MemoryDB;
use arbor_chain::{weight, ChainStore, Error, HeadChange};
use arbor_crypto::DomainSeparationTag;
use arbor_test_utils::{
    construct_block, construct_genesis, construct_state, empty_msg_meta, empty_receipts, keys_of,
    tipset_of,
};
use std::sync::Arc;

fn setup() -> (Arc<MemoryDB>, ChainStore<MemoryDB>) {
    let db = Arc::new(MemoryDB::default());
    let genesis = construct_genesis(db.as_ref());
    let cs = ChainStore::new(db.clone(), &genesis).unwrap();
    (db, cs)
}

#[test]
fn genesis_establishes_head_with_current_event() {
    let (_db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    let subscriber = cs.sub_head_changes();

    assert!(cs.heaviest_tipset().is_none());
    assert_eq!(cs.genesis_cid(), genesis.cid());
    cs.add_block(genesis.clone()).unwrap();

    let head = cs.heaviest_tipset().unwrap();
    assert_eq!(head.key(), &TipsetKeys::new(vec![*genesis.cid()]));

    let batch = subscriber.try_recv().unwrap();
    assert_eq!(batch, vec![HeadChange::Current(head)]);
}

#[test]
fn competing_blocks_merge_into_wider_tipset() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();

    let gen_ts = cs.heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();
    let b1 = construct_block(db.as_ref(), &gen_ts, 1, b"t1", w0.clone());
    let b2 = construct_block(db.as_ref(), &gen_ts, 2, b"t2", w0.clone());

    cs.add_block(b1.clone()).unwrap();
    let single = cs.heaviest_tipset().unwrap();
    assert_eq!(single.len(), 1);

    cs.add_block(b2.clone()).unwrap();
    let head = cs.heaviest_tipset().unwrap();
    assert_eq!(head.len(), 2);
    // members are ordered by ticket, smallest first
    assert_eq!(
        head.blocks().iter().map(|b| b.cid()).collect::<Vec<_>>(),
        vec![b1.cid(), b2.cid()]
    );

    // the two-block tipset outweighs both single-block alternatives
    let w_both = weight(db.as_ref(), &head).unwrap();
    let w_b1 = weight(db.as_ref(), &tipset_of(&b1)).unwrap();
    let w_b2 = weight(db.as_ref(), &tipset_of(&b2)).unwrap();
    assert!(w_both > w_b1);
    assert!(w_both > w_b2);
}

#[test]
fn reorg_emits_reverts_then_applies() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();
    let gen_ts = cs.heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    // chain A: G -> A1 -> A2
    let a1 = construct_block(db.as_ref(), &gen_ts, 1, b"a1", w0.clone());
    cs.add_block(a1.clone()).unwrap();
    let a1_ts = cs.heaviest_tipset().unwrap();
    let w_a1 = weight(db.as_ref(), &a1_ts).unwrap();
    let a2 = construct_block(db.as_ref(), &a1_ts, 1, b"a2", w_a1);
    cs.add_block(a2.clone()).unwrap();
    let a2_ts = cs.heaviest_tipset().unwrap();
    assert_eq!(a2_ts.key(), &keys_of(&[&a2]));

    let subscriber = cs.sub_head_changes();

    // chain B: G -> {B1a, B1b} -> B2; the two-block tipset plus its child
    // outweigh chain A
    let b1a = construct_block(db.as_ref(), &gen_ts, 2, b"b1a", w0.clone());
    let b1b = construct_block(db.as_ref(), &gen_ts, 3, b"b1b", w0.clone());
    cs.add_block(b1a.clone()).unwrap();
    cs.add_block(b1b.clone()).unwrap();
    // still on chain A, no events published
    assert_eq!(cs.heaviest_tipset().unwrap().key(), a2_ts.key());
    assert!(subscriber.try_recv().is_err());

    let b1_ts = Tipset::new(vec![b1a.clone(), b1b.clone()]).unwrap();
    let w_b1 = weight(db.as_ref(), &b1_ts).unwrap();
    let b2 = construct_block(db.as_ref(), &b1_ts, 2, b"b2", w_b1);
    cs.add_block(b2.clone()).unwrap();

    let head = cs.heaviest_tipset().unwrap();
    assert_eq!(head.key(), &keys_of(&[&b2]));

    let batch = subscriber.try_recv().unwrap();
    let shape: Vec<(&str, &TipsetKeys)> = batch
        .iter()
        .map(|change| match change {
            HeadChange::Revert(ts) => ("revert", ts.key()),
            HeadChange::Apply(ts) => ("apply", ts.key()),
            HeadChange::Current(ts) => ("current", ts.key()),
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            ("revert", &keys_of(&[&a2])),
            ("revert", &keys_of(&[&a1])),
            ("apply", &keys_of(&[&b1a, &b1b])),
            ("apply", &keys_of(&[&b2])),
        ]
    );
}

#[test]
fn equal_weight_breaks_ties_by_smaller_key() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();
    let gen_ts = cs.heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    // two siblings carrying the same ticket can never join one tipset, so
    // each stands alone at equal weight and only the key decides
    let c1 = construct_block(db.as_ref(), &gen_ts, 1, b"same", w0.clone());
    let c2 = construct_block(db.as_ref(), &gen_ts, 2, b"same", w0);
    assert_eq!(
        weight(db.as_ref(), &tipset_of(&c1)).unwrap(),
        weight(db.as_ref(), &tipset_of(&c2)).unwrap()
    );

    let k1 = keys_of(&[&c1]);
    let k2 = keys_of(&[&c2]);
    let (first, second) = if k1 < k2 { (c1, c2) } else { (c2, c1) };

    // smaller key first: the larger key neither outweighs nor under-keys it
    cs.add_block(first.clone()).unwrap();
    cs.add_block(second.clone()).unwrap();
    assert_eq!(cs.heaviest_tipset().unwrap().key(), &keys_of(&[&first]));

    // larger key first: the smaller key takes the head at equal weight
    let cs2 = ChainStore::new(db.clone(), &genesis).unwrap();
    cs2.add_block(genesis.clone()).unwrap();
    cs2.add_block(second).unwrap();
    cs2.add_block(first.clone()).unwrap();
    assert_eq!(cs2.heaviest_tipset().unwrap().key(), &keys_of(&[&first]));
}

#[test]
fn tipset_by_height_resolves_exact_and_rejects_future() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();
    let gen_ts = cs.heaviest_tipset().unwrap();

    let mut parent = gen_ts.clone();
    let mut tipsets = vec![gen_ts];
    for i in 1..=3u8 {
        let w = weight(db.as_ref(), &parent).unwrap();
        let blk = construct_block(db.as_ref(), &parent, 1, &[b't', i], w);
        cs.add_block(blk.clone()).unwrap();
        parent = cs.heaviest_tipset().unwrap();
        tipsets.push(parent.clone());
    }

    let t3 = tipsets[3].clone();
    let resolved = cs.tipset_by_height(2, Some(t3.clone())).unwrap();
    assert_eq!(resolved.key(), tipsets[2].key());

    let genesis_resolved = cs.tipset_by_height(0, Some(t3.clone())).unwrap();
    assert_eq!(genesis_resolved.key(), tipsets[0].key());

    // heights in the future of the starting tipset are an error
    assert!(matches!(
        cs.tipset_by_height(5, Some(t3)),
        Err(Error::Other(_))
    ));
}

#[test]
fn randomness_is_deterministic_and_domain_separated() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();
    let gen_ts = cs.heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();
    let b1 = construct_block(db.as_ref(), &gen_ts, 1, b"tkt", w0);
    cs.add_block(b1).unwrap();
    let head = cs.heaviest_tipset().unwrap();

    let r1 = cs
        .get_chain_randomness(
            head.key(),
            DomainSeparationTag::TicketProduction,
            1,
            b"entropy",
        )
        .unwrap();
    let r2 = cs
        .get_chain_randomness(
            head.key(),
            DomainSeparationTag::TicketProduction,
            1,
            b"entropy",
        )
        .unwrap();
    assert_eq!(r1, r2);

    let other_tag = cs
        .get_chain_randomness(
            head.key(),
            DomainSeparationTag::WinningPoStChallengeSeed,
            1,
            b"entropy",
        )
        .unwrap();
    assert_ne!(r1, other_tag);

    let other_entropy = cs
        .get_chain_randomness(
            head.key(),
            DomainSeparationTag::TicketProduction,
            1,
            b"different",
        )
        .unwrap();
    assert_ne!(r1, other_entropy);

    // drawing from the future is rejected
    assert!(cs
        .get_chain_randomness(head.key(), DomainSeparationTag::TicketProduction, 9, b"")
        .is_err());
}

#[test]
fn beacon_randomness_uses_latest_entry() {
    let db = Arc::new(MemoryDB::default());
    let genesis = BlockHeader::builder()
        .miner_address(arbor_address::Address::new_id(0))
        .epoch(0)
        .state_root(construct_state(db.as_ref()))
        .message_receipts(empty_receipts(db.as_ref()))
        .messages(empty_msg_meta(db.as_ref()))
        .beacon_entries(vec![BeaconEntry::new(1, b"drand signature".to_vec())])
        .build_and_validate()
        .unwrap();
    let cs = ChainStore::new(db, &genesis).unwrap();
    cs.add_block(genesis).unwrap();
    let head = cs.heaviest_tipset().unwrap();

    let r1 = cs
        .get_beacon_randomness(
            head.key(),
            DomainSeparationTag::WinningPoStChallengeSeed,
            0,
            b"e",
        )
        .unwrap();
    let r2 = cs
        .get_beacon_randomness(
            head.key(),
            DomainSeparationTag::WinningPoStChallengeSeed,
            0,
            b"e",
        )
        .unwrap();
    assert_eq!(r1, r2);

    let other = cs
        .get_beacon_randomness(head.key(), DomainSeparationTag::SealRandomness, 0, b"e")
        .unwrap();
    assert_ne!(r1, other);

    // the genesis block carries no ticket, so the ticket chain cannot seed
    // randomness here
    assert!(cs
        .get_chain_randomness(head.key(), DomainSeparationTag::TicketProduction, 0, b"e")
        .is_err());
}

#[test]
fn colliding_ticket_is_rejected_at_construction() {
    let (db, cs) = setup();
    let genesis = cs.genesis().unwrap();
    cs.add_block(genesis.clone()).unwrap();
    let gen_ts = cs.heaviest_tipset().unwrap();
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    let b1 = construct_block(db.as_ref(), &gen_ts, 1, b"same", w0.clone());
    let b2 = construct_block(db.as_ref(), &gen_ts, 2, b"same", w0);
    assert_eq!(
        Tipset::new(vec![b1, b2]).unwrap_err(),
        BlocksError::TicketsCollision
    );
}

#[test]
fn heaviest_matches_weight_maximal_tipset_after_any_ingestion_order() {
    // property 4: after ingesting a set of headers in two different orders
    // the head is the same weight-maximal tipset
    let db = Arc::new(MemoryDB::default());
    let genesis = construct_genesis(db.as_ref());
    let gen_ts = tipset_of(&genesis);
    let w0 = weight(db.as_ref(), &gen_ts).unwrap();

    let b1 = construct_block(db.as_ref(), &gen_ts, 1, b"m1", w0.clone());
    let b2 = construct_block(db.as_ref(), &gen_ts, 2, b"m2", w0.clone());
    let b3 = construct_block(db.as_ref(), &gen_ts, 3, b"m3", w0.clone());

    let orders: Vec<Vec<_>> = vec![
        vec![genesis.clone(), b1.clone(), b2.clone(), b3.clone()],
        vec![genesis.clone(), b3.clone(), b2.clone(), b1.clone()],
    ];

    let mut heads = Vec::new();
    for order in orders {
        let cs = ChainStore::new(db.clone(), &genesis).unwrap();
        for header in order {
            cs.add_block(header).unwrap();
        }
        heads.push(cs.heaviest_tipset().unwrap().key().clone());
    }
    assert_eq!(heads[0], heads[1]);
    assert_eq!(heads[0], keys_of(&[&b1, &b2, &b3]));
}
