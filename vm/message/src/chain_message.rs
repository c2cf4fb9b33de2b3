// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Message, SignedMessage, UnsignedMessage};
use arbor_address::Address;
use arbor_encoding::{Cbor, Error as EncodingError};
use arbor_vm::{MethodNum, Serialized, TokenAmount};
use cid::Cid;

/// Enum to encapsulate signed and unsigned messages. Useful when working
/// with both types, where a signed message through the bls scheme drops its
/// envelope on chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChainMessage {
    Unsigned(UnsignedMessage),
    Signed(SignedMessage),
}

impl ChainMessage {
    /// Content identifier of the message as referenced from a block.
    pub fn cid(&self) -> Result<Cid, EncodingError> {
        match self {
            ChainMessage::Unsigned(m) => m.cid(),
            ChainMessage::Signed(m) => m.cid(),
        }
    }
}

impl Message for ChainMessage {
    fn from(&self) -> &Address {
        match self {
            ChainMessage::Unsigned(t) => t.from(),
            ChainMessage::Signed(t) => t.from(),
        }
    }
    fn to(&self) -> &Address {
        match self {
            ChainMessage::Unsigned(t) => t.to(),
            ChainMessage::Signed(t) => t.to(),
        }
    }
    fn sequence(&self) -> u64 {
        match self {
            ChainMessage::Unsigned(t) => t.sequence(),
            ChainMessage::Signed(t) => t.sequence(),
        }
    }
    fn value(&self) -> &TokenAmount {
        match self {
            ChainMessage::Unsigned(t) => t.value(),
            ChainMessage::Signed(t) => t.value(),
        }
    }
    fn method_num(&self) -> MethodNum {
        match self {
            ChainMessage::Unsigned(t) => t.method_num(),
            ChainMessage::Signed(t) => t.method_num(),
        }
    }
    fn params(&self) -> &Serialized {
        match self {
            ChainMessage::Unsigned(t) => t.params(),
            ChainMessage::Signed(t) => t.params(),
        }
    }
    fn set_gas_limit(&mut self, limit: i64) {
        match self {
            ChainMessage::Unsigned(t) => t.set_gas_limit(limit),
            ChainMessage::Signed(t) => t.set_gas_limit(limit),
        }
    }
    fn gas_limit(&self) -> i64 {
        match self {
            ChainMessage::Unsigned(t) => t.gas_limit(),
            ChainMessage::Signed(t) => t.gas_limit(),
        }
    }
    fn gas_price(&self) -> &TokenAmount {
        match self {
            ChainMessage::Unsigned(t) => t.gas_price(),
            ChainMessage::Signed(t) => t.gas_price(),
        }
    }
}
