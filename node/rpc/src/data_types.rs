// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_blockstore::BlockStore;
use arbor_chain::HeadChange;
use arbor_state_manager::{MessageWaiter, StateManager};
use flume::Receiver;
use std::sync::Arc;

/// Shared state of all RPC handlers.
pub struct RpcState<DB> {
    pub state_manager: Arc<StateManager<DB>>,
    pub message_waiter: MessageWaiter,
}

impl<DB> RpcState<DB>
where
    DB: BlockStore,
{
    /// Subscription surface of `ChainNotify`: yields one batch per head
    /// transition. The streaming transport that carries the batches to a
    /// remote client lives outside this crate.
    pub fn chain_notify(&self) -> Receiver<Vec<HeadChange>> {
        self.state_manager.chain_store().sub_head_changes()
    }
}
