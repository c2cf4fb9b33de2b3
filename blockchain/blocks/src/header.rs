// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{ElectionProof, Ticket, TipsetKeys};
use arbor_address::Address;
use arbor_beacon::BeaconEntry;
use arbor_bigint::bigint_ser::{BigIntDe, BigIntSer};
use arbor_bigint::BigInt;
use arbor_clock::ChainEpoch;
use arbor_crypto::Signature;
use arbor_encoding::{
    de::{self, Deserializer},
    ser::{self, Serializer},
    Cbor, Error as EncodingError, DAG_CBOR,
};
use cid::multihash::{Code, MultihashDigest};
use cid::Cid;
use derive_builder::Builder;
use serde::Deserialize;
use std::fmt;

/// Header of a block.
///
/// Usage:
/// ```
/// use arbor_blocks::{BlockHeader, TipsetKeys, Ticket};
/// use arbor_address::Address;
/// use arbor_bigint::BigInt;
///
/// let header = BlockHeader::builder()
///     .miner_address(Address::new_id(0)) // required
///     .parents(TipsetKeys::default()) // optional
///     .weight(BigInt::from(0u8)) // optional
///     .epoch(0) // optional
///     .timestamp(0) // optional
///     .ticket(Some(Ticket::default())) // optional
///     .build_and_validate()
///     .unwrap();
/// assert_eq!(header.epoch(), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
#[builder(name = "BlockHeaderBuilder")]
pub struct BlockHeader {
    // CHAIN LINKING
    /// The set of parents this block was based on. Typically one, but can be
    /// several in the case where there were multiple winning ticket holders
    /// for an epoch.
    #[builder(default)]
    parents: TipsetKeys,

    /// The aggregate chain weight of the parent set.
    #[builder(default)]
    weight: BigInt,

    /// The period in which a new block is generated. There may be multiple
    /// rounds in an epoch.
    #[builder(default)]
    epoch: ChainEpoch,

    /// The beacon entries included in this block.
    #[builder(default)]
    beacon_entries: Vec<BeaconEntry>,

    // MINER INFO
    /// The address of the miner actor that mined this block.
    miner_address: Address,

    // STATE
    /// The Cid of the message meta linking the bls and secp message lists.
    #[builder(default)]
    messages: Cid,

    /// The Cid of the root of the receipts produced by the parent tipset.
    #[builder(default)]
    message_receipts: Cid,

    /// The Cid of the state root after calculating the parent tipset.
    #[builder(default)]
    state_root: Cid,

    #[builder(default)]
    fork_signal: u64,

    // CONSENSUS
    /// Timestamp, in seconds since the Unix epoch, at which this block was
    /// created.
    #[builder(default)]
    timestamp: u64,

    /// The ticket submitted with this block; only the genesis block carries
    /// none.
    #[builder(default)]
    ticket: Option<Ticket>,

    /// The proof that the miner won the leader election for this round.
    #[builder(default)]
    election_proof: Option<ElectionProof>,

    // SIGNATURES
    /// The signature of the miner over the serialized header.
    #[builder(default)]
    signature: Option<Signature>,

    // CACHE
    /// Stores the Cid for the block after the header is constructed.
    #[builder(default, setter(skip))]
    cached_cid: Cid,

    /// Stores the serialized bytes of the block after construction.
    #[builder(default, setter(skip))]
    cached_bytes: Vec<u8>,
}

impl Cbor for BlockHeader {
    fn cid(&self) -> Result<Cid, EncodingError> {
        // Cache is filled on construction
        Ok(*self.cid())
    }
}

impl ser::Serialize for BlockHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.miner_address,
            &self.ticket,
            &self.election_proof,
            &self.beacon_entries,
            &self.parents,
            BigIntSer(&self.weight),
            &self.epoch,
            &self.state_root,
            &self.message_receipts,
            &self.messages,
            &self.timestamp,
            &self.signature,
            &self.fork_signal,
        )
            .serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for BlockHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        let (
            miner_address,
            ticket,
            election_proof,
            beacon_entries,
            parents,
            BigIntDe(weight),
            epoch,
            state_root,
            message_receipts,
            messages,
            timestamp,
            signature,
            fork_signal,
        ) = Deserialize::deserialize(deserializer)?;

        let mut header = BlockHeader {
            miner_address,
            ticket,
            election_proof,
            beacon_entries,
            parents,
            weight,
            epoch,
            state_root,
            message_receipts,
            messages,
            timestamp,
            signature,
            fork_signal,
            cached_cid: Cid::default(),
            cached_bytes: Vec::new(),
        };
        header.update_cache().map_err(de::Error::custom)?;
        Ok(header)
    }
}

impl BlockHeader {
    /// Generates a BlockHeader builder as a constructor.
    pub fn builder() -> BlockHeaderBuilder {
        BlockHeaderBuilder::default()
    }
    /// Getter for BlockHeader parents.
    pub fn parents(&self) -> &TipsetKeys {
        &self.parents
    }
    /// Getter for BlockHeader weight.
    pub fn weight(&self) -> &BigInt {
        &self.weight
    }
    /// Getter for BlockHeader epoch.
    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }
    /// Getter for the beacon entries included in the block.
    pub fn beacon_entries(&self) -> &[BeaconEntry] {
        &self.beacon_entries
    }
    /// Getter for BlockHeader miner_address.
    pub fn miner_address(&self) -> &Address {
        &self.miner_address
    }
    /// Getter for BlockHeader messages.
    pub fn messages(&self) -> &Cid {
        &self.messages
    }
    /// Getter for BlockHeader message_receipts.
    pub fn message_receipts(&self) -> &Cid {
        &self.message_receipts
    }
    /// Getter for BlockHeader state_root.
    pub fn state_root(&self) -> &Cid {
        &self.state_root
    }
    /// Getter for BlockHeader timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
    /// Getter for BlockHeader ticket.
    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }
    /// Getter for BlockHeader election_proof.
    pub fn election_proof(&self) -> Option<&ElectionProof> {
        self.election_proof.as_ref()
    }
    /// Getter for BlockHeader signature.
    pub fn signature(&self) -> &Option<Signature> {
        &self.signature
    }
    /// Getter for BlockHeader fork_signal.
    pub fn fork_signal(&self) -> u64 {
        self.fork_signal
    }
    /// Getter for BlockHeader cid. The cache is initialized on construction,
    /// a default header that skipped validation returns the default Cid.
    pub fn cid(&self) -> &Cid {
        &self.cached_cid
    }
    /// Canonical serialization of the header, as committed to by its Cid.
    pub fn raw_data(&self) -> &[u8] {
        &self.cached_bytes
    }
    /// Updates the cached serialization and Cid of the header.
    fn update_cache(&mut self) -> Result<(), String> {
        self.cached_bytes = self.marshal_cbor().map_err(|e| e.to_string())?;
        self.cached_cid = Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(&self.cached_bytes));
        Ok(())
    }
}

/// Human-readable string representation of a block CID.
impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BlockHeader: {:?}", self.cid())
    }
}

impl BlockHeaderBuilder {
    pub fn build_and_validate(&self) -> Result<BlockHeader, String> {
        // Convert header builder into header struct
        let mut header = self.build().map_err(|e| e.to_string())?;

        // Fill header cache with raw bytes and cid
        header.update_cache()?;

        Ok(header)
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a BlockHeader from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct BlockHeaderJson(#[serde(with = "self")] pub BlockHeader);

    /// Wrapper for serializing a BlockHeader reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct BlockHeaderJsonRef<'a>(#[serde(with = "self")] pub &'a BlockHeader);

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "arbor_address::json")]
        miner: Address,
        #[serde(default, with = "crate::ticket::json::opt")]
        ticket: Option<Ticket>,
        #[serde(default, rename = "ElectionProof", with = "crate::election_proof::json::opt")]
        election_proof: Option<ElectionProof>,
        #[serde(default, with = "arbor_beacon::json::vec")]
        beacon_entries: Vec<BeaconEntry>,
        #[serde(with = "crate::tipset::json::keys")]
        parents: TipsetKeys,
        #[serde(rename = "ParentWeight", with = "arbor_bigint::bigint_ser::json")]
        weight: BigInt,
        #[serde(rename = "Height")]
        epoch: ChainEpoch,
        #[serde(rename = "ParentStateRoot", with = "arbor_encoding::json::cid")]
        state_root: Cid,
        #[serde(rename = "ParentMessageReceipts", with = "arbor_encoding::json::cid")]
        message_receipts: Cid,
        #[serde(with = "arbor_encoding::json::cid")]
        messages: Cid,
        timestamp: u64,
        #[serde(default, rename = "BlockSig", with = "arbor_crypto::json::opt")]
        signature: Option<Signature>,
        fork_signal: u64,
    }

    pub fn serialize<S>(m: &BlockHeader, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            miner: m.miner_address.clone(),
            ticket: m.ticket.clone(),
            election_proof: m.election_proof.clone(),
            beacon_entries: m.beacon_entries.clone(),
            parents: m.parents.clone(),
            weight: m.weight.clone(),
            epoch: m.epoch,
            state_root: m.state_root,
            message_receipts: m.message_receipts,
            messages: m.messages,
            timestamp: m.timestamp,
            signature: m.signature.clone(),
            fork_signal: m.fork_signal,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BlockHeader, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        BlockHeader::builder()
            .miner_address(m.miner)
            .ticket(m.ticket)
            .election_proof(m.election_proof)
            .beacon_entries(m.beacon_entries)
            .parents(m.parents)
            .weight(m.weight)
            .epoch(m.epoch)
            .state_root(m.state_root)
            .message_receipts(m.message_receipts)
            .messages(m.messages)
            .timestamp(m.timestamp)
            .signature(m.signature)
            .fork_signal(m.fork_signal)
            .build_and_validate()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_header_encoding() {
        let header = BlockHeader::builder()
            .miner_address(Address::new_id(7))
            .epoch(4)
            .ticket(Some(Ticket::new(arbor_crypto::VRFProof::new(
                b"ticket bytes".to_vec(),
            ))))
            .timestamp(1_600_000_000)
            .build_and_validate()
            .unwrap();

        let bz = header.marshal_cbor().unwrap();
        let decoded = BlockHeader::unmarshal_cbor(&bz).unwrap();
        assert_eq!(decoded, header);
        // re-encoded bytes are identical and commit to the same cid
        assert_eq!(decoded.raw_data(), header.raw_data());
        assert_eq!(decoded.cid(), header.cid());
    }

    #[test]
    fn cid_is_stable_across_clone() {
        let header = BlockHeader::builder()
            .miner_address(Address::new_id(1))
            .build_and_validate()
            .unwrap();
        assert_eq!(header.clone().cid(), header.cid());
    }
}
