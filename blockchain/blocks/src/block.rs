// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::BlockHeader;
use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;
use arbor_message::{SignedMessage, UnsignedMessage};
use cid::Cid;

/// A complete block: the header plus the messages it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Block {
    pub header: BlockHeader,
    pub bls_messages: Vec<UnsignedMessage>,
    pub secp_messages: Vec<SignedMessage>,
}

impl Block {
    /// Returns reference to the block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }
    /// Returns reference to the block's BLS messages.
    pub fn bls_msgs(&self) -> &[UnsignedMessage] {
        &self.bls_messages
    }
    /// Returns reference to the block's Secp256k1 messages.
    pub fn secp_msgs(&self) -> &[SignedMessage] {
        &self.secp_messages
    }
    /// Returns the content identifier of the block's header.
    pub fn cid(&self) -> &Cid {
        self.header.cid()
    }
}

impl Cbor for Block {}

/// Tracks the message list roots of both secp and bls messages separately,
/// referenced from a block header's `messages` field.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize_tuple, Deserialize_tuple)]
pub struct TxMeta {
    pub bls_messages: Cid,
    pub secp_messages: Cid,
}

impl Cbor for TxMeta {}
