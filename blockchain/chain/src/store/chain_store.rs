// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, Publisher, TipsetTracker};
use crate::weight;
use arbor_beacon::BeaconEntry;
use arbor_blocks::{BlockHeader, Tipset, TipsetKeys, TxMeta};
use arbor_blockstore::{BlockStore, Store};
use arbor_clock::ChainEpoch;
use arbor_crypto::DomainSeparationTag;
use arbor_message::{ChainMessage, MessageReceipt, SignedMessage, UnsignedMessage};
use blake2b_simd::Params;
use byteorder::{BigEndian, WriteBytesExt};
use cid::Cid;
use flume::Receiver;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

/// Capacity of each head change subscriber channel; a subscriber that lags
/// this far behind is disconnected.
const HEAD_CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Number of recent tipsets kept in memory by key.
const TIPSET_CACHE_SIZE: usize = 8192;

/// Tipsets to walk back when looking for the latest beacon entry before
/// giving up.
const BEACON_LOOKBACK_LIMIT: usize = 20;

/// Event emitted to subscribers when the heaviest tipset changes. A single
/// head transition is delivered as one batch: reverts child-to-parent, then
/// applies parent-to-child; the first head ever set is delivered as
/// `Current`.
#[derive(Clone, Debug, PartialEq)]
pub enum HeadChange {
    Current(Arc<Tipset>),
    Apply(Arc<Tipset>),
    Revert(Arc<Tipset>),
}

/// Stores chain data such as block headers and tipsets, tracks the current
/// heaviest tipset and notifies subscribers of head changes.
///
/// The store is the single writer of the head pointer; readers snapshot the
/// head by value. All blob storage belongs to the backing blockstore, the
/// chain store holds only CIDs.
pub struct ChainStore<DB> {
    db: Arc<DB>,

    /// CID of the genesis block header.
    genesis: Cid,

    /// Heaviest known tipset; `None` until the first block is ingested,
    /// which keeps "no head yet" distinct from a genesis head.
    heaviest: RwLock<Option<Arc<Tipset>>>,

    /// Cache of recently resolved tipsets by key.
    ts_cache: Mutex<LruCache<TipsetKeys, Arc<Tipset>>>,

    /// Tracks known blocks by height for tipset expansion.
    tipset_tracker: Mutex<TipsetTracker<DB>>,

    /// Fan-out of head change batches.
    publisher: Publisher<Vec<HeadChange>>,
}

impl<DB> ChainStore<DB>
where
    DB: BlockStore,
{
    /// Constructor; persists the genesis header but establishes no head
    /// until it is ingested through [`ChainStore::add_block`].
    pub fn new(db: Arc<DB>, genesis: &BlockHeader) -> Result<Self, Error> {
        db.write(genesis.cid().to_bytes(), genesis.raw_data())?;
        Ok(Self {
            genesis: *genesis.cid(),
            heaviest: RwLock::new(None),
            ts_cache: Mutex::new(LruCache::new(TIPSET_CACHE_SIZE)),
            tipset_tracker: Mutex::new(TipsetTracker::new(db.clone())),
            publisher: Publisher::new(HEAD_CHANGE_CHANNEL_CAPACITY),
            db,
        })
    }

    /// Returns the underlying blockstore.
    pub fn blockstore(&self) -> &DB {
        &self.db
    }

    /// Returns the genesis block header from the store.
    pub fn genesis(&self) -> Result<BlockHeader, Error> {
        self.db
            .get(&self.genesis)?
            .ok_or_else(|| Error::UndefinedKey("Genesis key does not exist".to_string()))
    }

    /// Returns the CID of the genesis block.
    pub fn genesis_cid(&self) -> &Cid {
        &self.genesis
    }

    /// Returns the current heaviest tipset, or `None` when no block has
    /// been ingested yet.
    pub fn heaviest_tipset(&self) -> Option<Arc<Tipset>> {
        self.heaviest.read().clone()
    }

    /// Subscribes to head changes. Each received batch is the linearized
    /// event sequence of a single head transition.
    pub fn sub_head_changes(&self) -> Receiver<Vec<HeadChange>> {
        self.publisher.subscribe()
    }

    /// Ingests a block header: persists it, expands it into the widest
    /// tipset formable with previously ingested blocks, and moves the head
    /// if that tipset outweighs the current one.
    pub fn add_block(&self, header: BlockHeader) -> Result<(), Error> {
        let expanded = {
            let mut tracker = self.tipset_tracker.lock();
            tracker.add(&header);
            tracker.expand(&header)
        };
        let tipset = match expanded {
            Ok(ts) => Arc::new(ts),
            Err(e) => {
                log::warn!("dropping block {}: {}", header.cid(), e);
                return Err(e);
            }
        };

        // Headers must be store-resident before the tipset can become head.
        self.persist_headers(&tipset)?;
        self.update_heaviest(tipset)
    }

    /// Persists all headers of a tipset which are not yet stored.
    pub fn persist_headers(&self, tipset: &Tipset) -> Result<(), Error> {
        let mut raw_header_data = Vec::new();
        let mut keys = Vec::new();
        for block in tipset.blocks() {
            if !self.db.exists(block.cid().to_bytes())? {
                raw_header_data.push(block.raw_data().to_vec());
                keys.push(block.cid().to_bytes());
            }
        }
        let values: Vec<_> = keys.into_iter().zip(raw_header_data).collect();
        self.db.bulk_write(&values)?;
        Ok(())
    }

    /// Resolves a tipset from its key, loading the member headers from the
    /// store if the tipset is not cached.
    pub fn tipset_from_keys(&self, keys: &TipsetKeys) -> Result<Arc<Tipset>, Error> {
        if let Some(ts) = self.ts_cache.lock().get(keys) {
            return Ok(ts.clone());
        }

        let ts = Arc::new(Tipset::load(self.db.as_ref(), keys.cids())?);
        self.ts_cache.lock().put(keys.clone(), ts.clone());
        Ok(ts)
    }

    /// Returns the tipset at the given height walking parents from `ts`
    /// (or from the current head when `None`). A height inside a run of
    /// null rounds resolves to the closest enclosing ancestor; a height
    /// beyond the starting tipset is an error.
    pub fn tipset_by_height(
        &self,
        height: ChainEpoch,
        ts: Option<Arc<Tipset>>,
    ) -> Result<Arc<Tipset>, Error> {
        let mut cur = match ts {
            Some(ts) => ts,
            None => self
                .heaviest_tipset()
                .ok_or_else(|| Error::Other("no known head".to_string()))?,
        };
        if height < 0 {
            return Err(Error::Other("negative height".to_string()));
        }
        if height > cur.epoch() {
            return Err(Error::Other(
                "searching for tipset beyond the height of the starting point".to_string(),
            ));
        }

        while cur.epoch() > height {
            cur = self.tipset_from_keys(cur.parents())?;
        }
        Ok(cur)
    }

    /// Compares the candidate tipset against the current head and installs
    /// it when it wins: strictly greater weight, or equal weight with the
    /// lexicographically smaller key.
    fn update_heaviest(&self, tipset: Arc<Tipset>) -> Result<(), Error> {
        // Single writer: hold the lock across compare and swap so head
        // updates and their published batches are totally ordered.
        let mut heaviest = self.heaviest.write();

        let wins = match heaviest.as_ref() {
            None => true,
            Some(current) => {
                let candidate_weight = weight(self.db.as_ref(), &tipset)?;
                let current_weight = weight(self.db.as_ref(), current)?;
                candidate_weight > current_weight
                    || (candidate_weight == current_weight && tipset.key() < current.key())
            }
        };
        if !wins {
            return Ok(());
        }

        let batch = match heaviest.as_ref() {
            None => vec![HeadChange::Current(tipset.clone())],
            Some(previous) => self.head_change_batch(previous.clone(), tipset.clone())?,
        };

        log::info!(
            "New heaviest tipset {:?} (epoch {})",
            tipset.cids(),
            tipset.epoch()
        );
        *heaviest = Some(tipset);
        self.publisher.publish(batch);
        Ok(())
    }

    /// Linearizes the transition `from -> to` around their lowest common
    /// ancestor: reverts child-to-parent, then applies parent-to-child.
    fn head_change_batch(
        &self,
        from: Arc<Tipset>,
        to: Arc<Tipset>,
    ) -> Result<Vec<HeadChange>, Error> {
        let mut to_revert = from;
        let mut to_apply = to;
        let mut reverts = Vec::new();
        let mut applies = Vec::new();

        while to_revert != to_apply {
            if to_revert.epoch() > to_apply.epoch() {
                let next = self.tipset_from_keys(to_revert.parents())?;
                reverts.push(to_revert);
                to_revert = next;
            } else {
                let next = self.tipset_from_keys(to_apply.parents())?;
                applies.push(to_apply);
                to_apply = next;
            }
        }

        Ok(reverts
            .into_iter()
            .map(HeadChange::Revert)
            .chain(applies.into_iter().rev().map(HeadChange::Apply))
            .collect())
    }

    /// Gets 32 bytes of deterministic randomness for the given domain
    /// separation tag and round, seeded from the ticket chain.
    pub fn get_chain_randomness(
        &self,
        blocks: &TipsetKeys,
        pers: DomainSeparationTag,
        round: ChainEpoch,
        entropy: &[u8],
    ) -> Result<[u8; 32], Error> {
        let ts = self.tipset_from_keys(blocks)?;
        if round > ts.epoch() {
            return Err(Error::Other(
                "cannot draw randomness from the future".to_string(),
            ));
        }
        let search_height = if round < 0 { 0 } else { round };
        let rand_ts = self.tipset_by_height(search_height, Some(ts))?;

        let ticket = rand_ts
            .min_ticket()
            .ok_or_else(|| Error::Other("no ticket exists for block".to_string()))?;
        draw_randomness(ticket.vrfproof.as_bytes(), pers, round, entropy)
    }

    /// Gets 32 bytes of deterministic randomness seeded from the beacon
    /// entry relevant at the given round.
    pub fn get_beacon_randomness(
        &self,
        blocks: &TipsetKeys,
        pers: DomainSeparationTag,
        round: ChainEpoch,
        entropy: &[u8],
    ) -> Result<[u8; 32], Error> {
        let ts = self.tipset_from_keys(blocks)?;
        if round > ts.epoch() {
            return Err(Error::Other(
                "cannot draw randomness from the future".to_string(),
            ));
        }
        let search_height = if round < 0 { 0 } else { round };
        let rand_ts = self.tipset_by_height(search_height, Some(ts))?;

        let entry = self.latest_beacon_entry(&rand_ts)?;
        draw_randomness(entry.data(), pers, round, entropy)
    }

    /// Returns the most recent beacon entry at or before the given tipset,
    /// walking at most [`BEACON_LOOKBACK_LIMIT`] parents.
    pub fn latest_beacon_entry(&self, ts: &Tipset) -> Result<BeaconEntry, Error> {
        let mut cur = ts.clone();
        for _ in 0..BEACON_LOOKBACK_LIMIT {
            if let Some(entry) = cur.min_ticket_block().beacon_entries().last() {
                return Ok(entry.clone());
            }
            if cur.epoch() == 0 {
                return Err(Error::Other(
                    "made it back to genesis block without finding beacon entry".to_string(),
                ));
            }
            cur = self.load_parent(&cur)?;
        }
        Err(Error::Other(format!(
            "no beacon entries found in the last {} tipsets",
            BEACON_LOOKBACK_LIMIT
        )))
    }

    fn load_parent(&self, ts: &Tipset) -> Result<Tipset, Error> {
        Ok(ts.load_parent(self.db.as_ref())?)
    }
}

/// Computes a deterministic 32 byte value from the domain separation tag,
/// the round, the randomness base and the caller supplied entropy. The
/// exact byte layout is part of the wire contract.
pub fn draw_randomness(
    rbase: &[u8],
    pers: DomainSeparationTag,
    round: ChainEpoch,
    entropy: &[u8],
) -> Result<[u8; 32], Error> {
    let mut state = Params::new().hash_length(32).to_state();
    state
        .write_u64::<BigEndian>(pers as u64)
        .map_err(|e| Error::Other(e.to_string()))?;
    state
        .write_i64::<BigEndian>(round)
        .map_err(|e| Error::Other(e.to_string()))?;
    state.write_all(rbase).map_err(|e| Error::Other(e.to_string()))?;
    state
        .write_all(entropy)
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut ret = [0u8; 32];
    ret.clone_from_slice(state.finalize().as_bytes());
    Ok(ret)
}

/// Returns the message cid lists referenced by a block header's message
/// meta, bls then secp.
pub fn read_msg_cids<DB>(db: &DB, msg_cid: &Cid) -> Result<(Vec<Cid>, Vec<Cid>), Error>
where
    DB: BlockStore,
{
    let meta: TxMeta = db
        .get(msg_cid)?
        .ok_or_else(|| Error::UndefinedKey(format!("message meta {} not found", msg_cid)))?;
    let bls_cids: Vec<Cid> = db
        .get(&meta.bls_messages)?
        .ok_or_else(|| Error::UndefinedKey("bls message list not found".to_string()))?;
    let secp_cids: Vec<Cid> = db
        .get(&meta.secp_messages)?
        .ok_or_else(|| Error::UndefinedKey("secp message list not found".to_string()))?;
    Ok((bls_cids, secp_cids))
}

/// Returns the messages referenced from a block header, bls then secp.
pub fn block_messages<DB>(
    db: &DB,
    bh: &BlockHeader,
) -> Result<(Vec<UnsignedMessage>, Vec<SignedMessage>), Error>
where
    DB: BlockStore,
{
    let (bls_cids, secp_cids) = read_msg_cids(db, bh.messages())?;

    let bls_msgs: Vec<UnsignedMessage> = messages_from_cids(db, &bls_cids)?;
    let secp_msgs: Vec<SignedMessage> = messages_from_cids(db, &secp_cids)?;

    Ok((bls_msgs, secp_msgs))
}

/// Returns the messages of all blocks in a tipset in visit order, each
/// message at most once. The deduplication window is the tipset itself,
/// not any wider walk.
pub fn messages_for_tipset<DB>(db: &DB, ts: &Tipset) -> Result<Vec<ChainMessage>, Error>
where
    DB: BlockStore,
{
    let mut visited: HashSet<Cid> = HashSet::new();
    let mut messages = Vec::new();

    for bh in ts.blocks() {
        let (bls_cids, secp_cids) = read_msg_cids(db, bh.messages())?;
        for (cid, msg) in bls_cids
            .iter()
            .zip(messages_from_cids::<DB, UnsignedMessage>(db, &bls_cids)?)
        {
            if visited.insert(*cid) {
                messages.push(ChainMessage::Unsigned(msg));
            }
        }
        for (cid, msg) in secp_cids
            .iter()
            .zip(messages_from_cids::<DB, SignedMessage>(db, &secp_cids)?)
        {
            if visited.insert(*cid) {
                messages.push(ChainMessage::Signed(msg));
            }
        }
    }

    Ok(messages)
}

/// Loads a message by cid, whichever envelope it was stored with.
pub fn get_chain_message<DB>(db: &DB, cid: &Cid) -> Result<ChainMessage, Error>
where
    DB: BlockStore,
{
    let bz = db
        .get_bytes(cid)?
        .ok_or_else(|| Error::UndefinedKey(format!("message {} not found", cid)))?;
    if let Ok(msg) = arbor_encoding::from_slice::<UnsignedMessage>(&bz) {
        return Ok(ChainMessage::Unsigned(msg));
    }
    let msg = arbor_encoding::from_slice::<SignedMessage>(&bz)
        .map_err(|e| arbor_encoding::Error::Decoding(e.to_string()))?;
    Ok(ChainMessage::Signed(msg))
}

/// Returns the receipts of the parent tipset's execution, as referenced
/// from the header.
pub fn parent_receipts<DB>(db: &DB, bh: &BlockHeader) -> Result<Vec<MessageReceipt>, Error>
where
    DB: BlockStore,
{
    db.get(bh.message_receipts())?
        .ok_or_else(|| Error::UndefinedKey("parent receipts not found".to_string()))
}

/// Reads a list of typed values from the store by cid.
pub fn messages_from_cids<DB, T>(db: &DB, keys: &[Cid]) -> Result<Vec<T>, Error>
where
    DB: BlockStore,
    T: serde::de::DeserializeOwned,
{
    keys.iter()
        .map(|k| {
            db.get(k)?
                .ok_or_else(|| Error::UndefinedKey(format!("message {} not found", k)))
        })
        .collect()
}
