// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod chain_message;
mod message;

pub mod message_receipt;
pub mod signed_message;
pub mod unsigned_message;

pub use self::chain_message::*;
pub use self::message::*;
pub use self::message_receipt::MessageReceipt;
pub use self::signed_message::SignedMessage;
pub use self::unsigned_message::{MessageBuilder, UnsignedMessage};
