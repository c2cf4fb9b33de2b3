// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{Error, StateManager};
use arbor_blocks::Tipset;
use arbor_blockstore::BlockStore;
use arbor_message::{Message, MessageReceipt, UnsignedMessage};
use std::sync::Arc;

/// Gas limit applied to implicit calls that did not specify one.
const IMPLICIT_CALL_GAS_LIMIT: i64 = 10_000_000_000;

/// Result of a read-only state call.
#[derive(Clone, Debug)]
pub struct InvocResult {
    pub msg: UnsignedMessage,
    pub msg_rct: Option<MessageReceipt>,
    pub error: Option<String>,
}

pub type StateCallResult = Result<InvocResult, Error>;

impl<DB> StateManager<DB>
where
    DB: BlockStore,
{
    /// Applies the message as an implicit call over the parent state of the
    /// given tipset (or the current head) without persisting any effect.
    /// Aborts from actor code are normalized into the returned receipt's
    /// exit code; fatal interpreter errors propagate.
    pub fn call(&self, message: &mut UnsignedMessage, tipset: Option<Arc<Tipset>>) -> StateCallResult {
        let ts = match tipset {
            Some(ts) => ts,
            None => self
                .chain_store()
                .heaviest_tipset()
                .ok_or_else(|| Error::Other("no known head".to_string()))?,
        };
        let state_root = ts.parent_state();

        if message.gas_limit() == 0 {
            message.set_gas_limit(IMPLICIT_CALL_GAS_LIMIT);
        }

        let ret = self
            .interpreter()
            .apply_implicit_message(self.blockstore(), message, state_root, ts.epoch())
            .map_err(|e| Error::Other(e.to_string()))?;

        if let Some(err) = &ret.act_error {
            if err.is_fatal() {
                return Err(Error::Other(format!(
                    "fatal error during call execution: {}",
                    err
                )));
            }
            log::warn!("chain call failed: {}", err);
        }

        Ok(InvocResult {
            msg: message.clone(),
            msg_rct: Some(ret.msg_receipt.clone()),
            error: ret.act_error.map(|e| e.to_string()),
        })
    }
}
