// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_address::Address;
use arbor_vm::{MethodNum, Serialized, TokenAmount};

/// Message interface to interact with Signed and unsigned messages in a
/// generic context.
pub trait Message {
    /// Returns the from address of the message.
    fn from(&self) -> &Address;
    /// Returns the destination address of the message.
    fn to(&self) -> &Address;
    /// Returns the message sequence or nonce.
    fn sequence(&self) -> u64;
    /// Returns the amount sent in message.
    fn value(&self) -> &TokenAmount;
    /// Returns the method number to be called.
    fn method_num(&self) -> MethodNum;
    /// Returns the encoded parameters for the method call.
    fn params(&self) -> &Serialized;
    /// Sets the gas limit of the message.
    fn set_gas_limit(&mut self, amount: i64);
    /// Returns the gas limit for the message.
    fn gas_limit(&self) -> i64;
    /// Returns the gas price for the message.
    fn gas_price(&self) -> &TokenAmount;
}
