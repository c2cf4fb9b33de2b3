// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Block, BlockHeader, Error, Ticket};
use arbor_bigint::BigInt;
use arbor_blockstore::BlockStore;
use arbor_clock::ChainEpoch;
use arbor_encoding::{
    blake2b_256,
    de::{self, Deserializer},
    ser::{self, Serializer},
    Cbor,
};
use cid::Cid;
use serde::Deserialize;
use std::cmp::Ordering;

/// A set of CIDs forming a unique key for a Tipset: the member block CIDs in
/// the canonical (ticket) order. Total ordering over keys is lexicographic
/// over the concatenated CID bytes, which is what head-selection tie breaks
/// compare.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TipsetKeys {
    pub cids: Vec<Cid>,
}

impl TipsetKeys {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self { cids }
    }

    /// Returns tipset header cids.
    pub fn cids(&self) -> &[Cid] {
        &self.cids
    }

    /// Concatenated bytes of the member cids, the preimage of [`TipsetKeys::hash`].
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for cid in &self.cids {
            bytes.extend_from_slice(&cid.to_bytes());
        }
        bytes
    }

    /// Canonical digest over the ordered member cids.
    pub fn hash(&self) -> [u8; 32] {
        blake2b_256(&self.bytes())
    }
}

impl PartialOrd for TipsetKeys {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TipsetKeys {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(&other.bytes())
    }
}

impl ser::Serialize for TipsetKeys {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.cids.serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for TipsetKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let cids: Vec<Cid> = Deserialize::deserialize(deserializer)?;
        Ok(TipsetKeys { cids })
    }
}

impl Cbor for TipsetKeys {}

/// An immutable set of blocks at the same height with the same parent set.
/// Blocks in a tipset are canonically ordered by ticket, strictly ascending;
/// two member blocks may never share a ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tipset {
    blocks: Vec<BlockHeader>,
    key: TipsetKeys,
}

#[allow(clippy::len_without_is_empty)]
impl Tipset {
    /// Builds a new Tipset from a collection of blocks. The blocks must be
    /// distinct, share height and parents, and carry distinct tickets.
    pub fn new(headers: Vec<BlockHeader>) -> Result<Self, Error> {
        verify_blocks(&headers)?;

        let mut sorted_headers = headers;
        // Sort headers by ticket, falling back to the distinct header cids
        // only to keep the sort stable; equal tickets are rejected below.
        sorted_headers.sort_by(|a, b| {
            a.ticket()
                .cmp(&b.ticket())
                .then_with(|| a.cid().to_bytes().cmp(&b.cid().to_bytes()))
        });

        for pair in sorted_headers.windows(2) {
            if pair[0].ticket() == pair[1].ticket() {
                return Err(Error::TicketsCollision);
            }
        }

        let cids = sorted_headers.iter().map(|h| *h.cid()).collect();
        Ok(Self {
            blocks: sorted_headers,
            key: TipsetKeys { cids },
        })
    }

    /// Builds a Tipset that is expected to hash to the given key; fails with
    /// `BlockOrderFailure` when the derived key differs.
    pub fn with_key(key: TipsetKeys, headers: Vec<BlockHeader>) -> Result<Self, Error> {
        let ts = Self::new(headers)?;
        if ts.key != key {
            return Err(Error::BlockOrderFailure);
        }
        Ok(ts)
    }

    /// Loads the headers for the given cids from the store and rebuilds the
    /// tipset.
    pub fn load<DB: BlockStore>(store: &DB, cids: &[Cid]) -> Result<Self, Error> {
        let mut headers = Vec::with_capacity(cids.len());
        for cid in cids {
            let header: BlockHeader = store
                .get(cid)?
                .ok_or_else(|| Error::Store(format!("header {} not found", cid)))?;
            headers.push(header);
        }
        Self::new(headers)
    }

    /// Loads the tipset this tipset's blocks are built on.
    pub fn load_parent<DB: BlockStore>(&self, store: &DB) -> Result<Self, Error> {
        Self::load(store, self.parents().cids())
    }

    /// Returns epoch of the tipset.
    pub fn epoch(&self) -> ChainEpoch {
        self.blocks[0].epoch()
    }
    /// Returns all blocks in tipset.
    pub fn blocks(&self) -> &[BlockHeader] {
        &self.blocks
    }
    /// Consumes tipset to convert into a vector of blocks.
    pub fn into_blocks(self) -> Vec<BlockHeader> {
        self.blocks
    }
    /// Returns the smallest ticket of all blocks in the tipset.
    pub fn min_ticket(&self) -> Option<&Ticket> {
        self.blocks[0].ticket()
    }
    /// Returns the block with the smallest ticket, the deterministic
    /// representative of the tipset.
    pub fn min_ticket_block(&self) -> &BlockHeader {
        &self.blocks[0]
    }
    /// Returns the smallest timestamp of all blocks in the tipset.
    pub fn min_timestamp(&self) -> u64 {
        self.blocks
            .iter()
            .map(|block| block.timestamp())
            .min()
            .expect("tipset is non-empty")
    }
    /// Returns the number of blocks in the tipset.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    /// Returns a key for the tipset.
    pub fn key(&self) -> &TipsetKeys {
        &self.key
    }
    /// Returns slice of Cids for the current tipset, in canonical order.
    pub fn cids(&self) -> &[Cid] {
        self.key.cids()
    }
    /// Returns the keys of the parents of the blocks in the tipset.
    pub fn parents(&self) -> &TipsetKeys {
        self.blocks[0].parents()
    }
    /// Returns the state root of the tipset's parent. All member blocks
    /// agree on this value.
    pub fn parent_state(&self) -> &Cid {
        self.blocks[0].state_root()
    }
    /// Returns the receipts root for the execution of the tipset's parent.
    pub fn parent_receipts(&self) -> &Cid {
        self.blocks[0].message_receipts()
    }
    /// Returns the tipset's parent weight.
    pub fn weight(&self) -> &BigInt {
        self.blocks[0].weight()
    }
    /// Whether the given block cid is a member of this tipset.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.key.cids().contains(cid)
    }
}

fn verify_blocks(headers: &[BlockHeader]) -> Result<(), Error> {
    if headers.is_empty() {
        return Err(Error::NoBlocks);
    }

    let first = &headers[0];
    for header in headers {
        if header.epoch() != first.epoch() {
            return Err(Error::MismatchingHeights);
        }
        if header.parents() != first.parents() {
            return Err(Error::MismatchingParents);
        }
        // Only a sole genesis block may omit the ticket
        if header.ticket().is_none() && (headers.len() > 1 || header.epoch() != 0) {
            return Err(Error::TicketHasNoValue);
        }
        if header.state_root() != first.state_root() {
            return Err(Error::InvalidTipset(
                "state roots are not equal".to_string(),
            ));
        }
        if header.message_receipts() != first.message_receipts() {
            return Err(Error::InvalidTipset(
                "message receipts are not equal".to_string(),
            ));
        }
        if header.weight() != first.weight() {
            return Err(Error::InvalidTipset("weights are not equal".to_string()));
        }
    }
    Ok(())
}

impl ser::Serialize for Tipset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.key.cids(), &self.blocks, self.epoch()).serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for Tipset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (cids, blks, height): (Vec<Cid>, Vec<BlockHeader>, ChainEpoch) =
            Deserialize::deserialize(deserializer)?;

        let tipset = Tipset::new(blks).map_err(de::Error::custom)?;
        if tipset.key.cids() != cids.as_slice() {
            return Err(de::Error::custom(Error::BlockOrderFailure.to_string()));
        }
        if tipset.epoch() != height {
            return Err(de::Error::custom(Error::MismatchingHeights.to_string()));
        }
        Ok(tipset)
    }
}

impl Cbor for Tipset {}

/// FullTipset is an expanded version of a tipset that contains all the blocks
/// and messages.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTipset {
    blocks: Vec<Block>,
}

impl FullTipset {
    /// Constructor; panics when the given vector is empty.
    pub fn new(blocks: Vec<Block>) -> Self {
        assert!(!blocks.is_empty());
        Self { blocks }
    }
    /// Returns reference to all blocks in a full tipset.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
    /// Returns all blocks in a full tipset.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
    /// Converts the full tipset into a Tipset of bare headers.
    pub fn to_tipset(&self) -> Result<Tipset, Error> {
        let headers = self.blocks.iter().map(|b| b.header().clone()).collect();
        Tipset::new(headers)
    }
    /// Returns the state root of the tipset's parent.
    pub fn parent_state(&self) -> &Cid {
        self.blocks[0].header().state_root()
    }
    /// Returns epoch of the tipset.
    pub fn epoch(&self) -> ChainEpoch {
        self.blocks[0].header().epoch()
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a Tipset from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct TipsetJson(#[serde(with = "self")] pub Tipset);

    /// Wrapper for serializing a Tipset reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct TipsetJsonRef<'a>(#[serde(with = "self")] pub &'a Tipset);

    impl From<TipsetJson> for Tipset {
        fn from(wrapper: TipsetJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Cids", with = "arbor_encoding::json::cid::vec")]
        cids: Vec<Cid>,
        #[serde(rename = "Blocks", with = "header_vec")]
        blocks: Vec<BlockHeader>,
        #[serde(rename = "Height")]
        height: ChainEpoch,
    }

    mod header_vec {
        use super::*;
        use crate::header::json::{BlockHeaderJson, BlockHeaderJsonRef};
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[BlockHeader], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&BlockHeaderJsonRef(e))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BlockHeader>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let hdrs: Vec<BlockHeaderJson> = Deserialize::deserialize(deserializer)?;
            Ok(hdrs.into_iter().map(|h| h.0).collect())
        }
    }

    pub fn serialize<S>(m: &Tipset, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            cids: m.key.cids.clone(),
            blocks: m.blocks.clone(),
            height: m.epoch(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tipset, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Tipset::with_key(TipsetKeys::new(m.cids), m.blocks)
            .map_err(serde::de::Error::custom)
    }

    pub mod keys {
        use super::*;

        /// Wrapper for serializing and deserializing TipsetKeys from JSON.
        #[derive(Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct TipsetKeysJson(#[serde(with = "self")] pub TipsetKeys);

        impl From<TipsetKeysJson> for TipsetKeys {
            fn from(wrapper: TipsetKeysJson) -> Self {
                wrapper.0
            }
        }

        pub fn serialize<S>(m: &TipsetKeys, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            arbor_encoding::json::cid::vec::serialize(m.cids(), serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<TipsetKeys, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(TipsetKeys {
                cids: arbor_encoding::json::cid::vec::deserialize(deserializer)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_address::Address;
    use arbor_crypto::VRFProof;

    fn ticket(bytes: &[u8]) -> Ticket {
        Ticket::new(VRFProof::new(bytes.to_vec()))
    }

    fn header(miner: u64, epoch: i64, t: &[u8]) -> BlockHeader {
        BlockHeader::builder()
            .miner_address(Address::new_id(miner))
            .epoch(epoch)
            .ticket(Some(ticket(t)))
            .build_and_validate()
            .unwrap()
    }

    #[test]
    fn no_blocks() {
        assert_eq!(Tipset::new(vec![]).unwrap_err(), Error::NoBlocks);
    }

    #[test]
    fn sorts_by_ticket() {
        let b1 = header(1, 1, b"b");
        let b2 = header(2, 1, b"a");
        let b3 = header(3, 1, b"c");
        let ts = Tipset::new(vec![b1.clone(), b2.clone(), b3.clone()]).unwrap();
        assert_eq!(
            ts.blocks().iter().map(|b| b.cid()).collect::<Vec<_>>(),
            vec![b2.cid(), b1.cid(), b3.cid()]
        );
        assert_eq!(ts.min_ticket(), Some(&ticket(b"a")));
        // key follows the sorted block order
        assert_eq!(ts.cids(), &[*b2.cid(), *b1.cid(), *b3.cid()]);
        assert!(ts.contains(b1.cid()));
    }

    #[test]
    fn construction_is_order_independent() {
        let b1 = header(1, 1, b"x");
        let b2 = header(2, 1, b"y");
        let a = Tipset::new(vec![b1.clone(), b2.clone()]).unwrap();
        let b = Tipset::new(vec![b2, b1]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn round_trips_through_key() {
        let b1 = header(1, 3, b"t1");
        let b2 = header(2, 3, b"t2");
        let ts = Tipset::new(vec![b1.clone(), b2.clone()]).unwrap();
        let rebuilt = Tipset::with_key(ts.key().clone(), vec![b2, b1]).unwrap();
        assert_eq!(rebuilt, ts);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let b1 = header(1, 3, b"t1");
        let b2 = header(2, 3, b"t2");
        let ts = Tipset::new(vec![b1.clone()]).unwrap();
        assert_eq!(
            Tipset::with_key(ts.key().clone(), vec![b2]).unwrap_err(),
            Error::BlockOrderFailure
        );
    }

    #[test]
    fn tickets_collision() {
        let b1 = header(1, 1, b"same");
        let b2 = header(2, 1, b"same");
        assert_eq!(
            Tipset::new(vec![b1, b2]).unwrap_err(),
            Error::TicketsCollision
        );
    }

    #[test]
    fn mismatching_heights() {
        let b1 = header(1, 1, b"a");
        let b2 = header(2, 2, b"b");
        assert_eq!(
            Tipset::new(vec![b1, b2]).unwrap_err(),
            Error::MismatchingHeights
        );
    }

    #[test]
    fn mismatching_parents() {
        let parent = header(9, 0, b"p");
        let b1 = BlockHeader::builder()
            .miner_address(Address::new_id(1))
            .epoch(1)
            .ticket(Some(ticket(b"a")))
            .parents(TipsetKeys::new(vec![*parent.cid()]))
            .build_and_validate()
            .unwrap();
        let b2 = header(2, 1, b"b");
        assert_eq!(
            Tipset::new(vec![b1, b2]).unwrap_err(),
            Error::MismatchingParents
        );
    }

    #[test]
    fn missing_ticket() {
        let b1 = BlockHeader::builder()
            .miner_address(Address::new_id(1))
            .epoch(1)
            .build_and_validate()
            .unwrap();
        assert_eq!(
            Tipset::new(vec![b1]).unwrap_err(),
            Error::TicketHasNoValue
        );

        // a sole genesis block carries no ticket
        let genesis = BlockHeader::builder()
            .miner_address(Address::new_id(0))
            .epoch(0)
            .build_and_validate()
            .unwrap();
        assert!(Tipset::new(vec![genesis]).is_ok());
    }

    #[test]
    fn min_timestamp() {
        let b1 = BlockHeader::builder()
            .miner_address(Address::new_id(1))
            .epoch(1)
            .ticket(Some(ticket(b"a")))
            .timestamp(50)
            .build_and_validate()
            .unwrap();
        let b2 = BlockHeader::builder()
            .miner_address(Address::new_id(2))
            .epoch(1)
            .ticket(Some(ticket(b"b")))
            .timestamp(40)
            .build_and_validate()
            .unwrap();
        let ts = Tipset::new(vec![b1, b2]).unwrap();
        assert_eq!(ts.min_timestamp(), 40);
    }

    #[test]
    fn symmetric_tipset_encoding() {
        let b1 = header(1, 2, b"t1");
        let b2 = header(2, 2, b"t2");
        let ts = Tipset::new(vec![b1, b2]).unwrap();

        let bz = ts.marshal_cbor().unwrap();
        let decoded = Tipset::unmarshal_cbor(&bz).unwrap();
        assert_eq!(decoded, ts);
        assert_eq!(decoded.marshal_cbor().unwrap(), bz);
    }

    #[test]
    fn decode_rejects_reordered_cids() {
        let b1 = header(1, 2, b"t1");
        let b2 = header(2, 2, b"t2");
        let ts = Tipset::new(vec![b1.clone(), b2.clone()]).unwrap();

        // encode with cids swapped out of canonical order
        let mut cids = ts.cids().to_vec();
        cids.reverse();
        let bz =
            arbor_encoding::to_vec(&(cids, ts.blocks(), ts.epoch())).unwrap();
        assert!(Tipset::unmarshal_cbor(&bz).is_err());
    }

    #[test]
    fn full_tipset_flattens_to_tipset() {
        use crate::Block;
        use arbor_message::UnsignedMessage;

        let h1 = header(1, 4, b"t1");
        let h2 = header(2, 4, b"t2");
        let msg = UnsignedMessage::builder()
            .from(arbor_address::Address::new_id(10))
            .to(arbor_address::Address::new_id(11))
            .build()
            .unwrap();
        let full = FullTipset::new(vec![
            Block {
                header: h1.clone(),
                bls_messages: vec![msg],
                secp_messages: vec![],
            },
            Block {
                header: h2.clone(),
                bls_messages: vec![],
                secp_messages: vec![],
            },
        ]);
        assert_eq!(full.epoch(), 4);
        assert_eq!(
            full.to_tipset().unwrap(),
            Tipset::new(vec![h1, h2]).unwrap()
        );
    }

    #[test]
    fn key_ordering_is_lexicographic() {
        let b1 = header(1, 1, b"a");
        let b2 = header(2, 1, b"b");
        let k1 = TipsetKeys::new(vec![*b1.cid()]);
        let k2 = TipsetKeys::new(vec![*b2.cid()]);
        assert_ne!(k1.cmp(&k2), Ordering::Equal);
        assert_eq!(k1.cmp(&k2), k1.bytes().cmp(&k2.bytes()));
        assert_ne!(k1.hash(), k2.hash());
    }
}
