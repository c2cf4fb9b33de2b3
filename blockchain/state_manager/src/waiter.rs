// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{Error, StateManager};
use arbor_blocks::{Tipset, TipsetKeys};
use arbor_blockstore::BlockStore;
use arbor_chain::HeadChange;
use arbor_message::MessageReceipt;
use cid::Cid;
use futures::channel::oneshot;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves "wait for message" requests against applied tipsets. A listener
/// task follows head changes; when a receipt for a watched message cid first
/// appears in an applied tipset, registered one-shot callbacks fire and the
/// result is recorded for later lookups.
///
/// Cancellation is dropping the receiving end; the waiter prunes the dead
/// callback on the next delivery attempt.
pub struct MessageWaiter {
    results: Arc<RwLock<HashMap<Cid, (MessageReceipt, TipsetKeys)>>>,
    waiters: Arc<Mutex<Vec<(Cid, oneshot::Sender<(MessageReceipt, TipsetKeys)>)>>>,
}

impl MessageWaiter {
    /// Spawns the listener task over the state manager's head changes.
    pub fn spawn<DB>(sm: Arc<StateManager<DB>>) -> Self
    where
        DB: BlockStore + Send + Sync + 'static,
    {
        let results: Arc<RwLock<HashMap<Cid, (MessageReceipt, TipsetKeys)>>> = Default::default();
        let waiters: Arc<Mutex<Vec<(Cid, oneshot::Sender<(MessageReceipt, TipsetKeys)>)>>> =
            Default::default();

        let listener_results = results.clone();
        let listener_waiters = waiters.clone();
        let subscription = sm.chain_store().sub_head_changes();
        async_std::task::spawn(async move {
            while let Ok(batch) = subscription.recv_async().await {
                for change in batch {
                    let ts = match &change {
                        HeadChange::Apply(ts) | HeadChange::Current(ts) => ts.clone(),
                        HeadChange::Revert(_) => continue,
                    };
                    if let Err(e) =
                        Self::process_tipset(&sm, &listener_results, &listener_waiters, ts).await
                    {
                        log::warn!("message waiter failed to process tipset: {}", e);
                    }
                }
            }
        });

        Self { results, waiters }
    }

    /// Receipts recorded so far, keyed by message cid.
    pub fn results(&self) -> Arc<RwLock<HashMap<Cid, (MessageReceipt, TipsetKeys)>>> {
        self.results.clone()
    }

    /// Waits until a receipt for the message cid is recorded. Returns
    /// immediately when it already is.
    pub async fn wait(&self, cid: Cid) -> Result<(MessageReceipt, TipsetKeys), Error> {
        if let Some(found) = self.results.read().get(&cid) {
            return Ok(found.clone());
        }

        let (sender, receiver) = oneshot::channel();
        self.waiters.lock().push((cid, sender));

        // Re-check to close the race with a delivery that happened between
        // the lookup above and the registration.
        if let Some(found) = self.results.read().get(&cid) {
            return Ok(found.clone());
        }

        receiver
            .await
            .map_err(|_| Error::Other("message waiter shut down".to_string()))
    }

    async fn process_tipset<DB>(
        sm: &Arc<StateManager<DB>>,
        results: &Arc<RwLock<HashMap<Cid, (MessageReceipt, TipsetKeys)>>>,
        waiters: &Arc<Mutex<Vec<(Cid, oneshot::Sender<(MessageReceipt, TipsetKeys)>)>>>,
        ts: Arc<Tipset>,
    ) -> Result<(), Error>
    where
        DB: BlockStore + Send + Sync + 'static,
    {
        let messages = arbor_chain::messages_for_tipset(sm.blockstore(), &ts)?;
        if messages.is_empty() {
            return Ok(());
        }

        let (_state_root, receipts_root) = sm.tipset_state(&ts).await?;
        let receipts: Vec<MessageReceipt> = sm
            .blockstore()
            .get(&receipts_root)?
            .ok_or_else(|| Error::Other("receipts not found for applied tipset".to_string()))?;

        for (index, message) in messages.iter().enumerate() {
            let cid = message.cid()?;
            let receipt = match receipts.get(index) {
                Some(receipt) => receipt.clone(),
                None => {
                    log::warn!("receipt list shorter than message list for {:?}", ts.key());
                    break;
                }
            };

            let entry = (receipt, ts.key().clone());
            results.write().entry(cid).or_insert_with(|| entry.clone());

            let mut pending = waiters.lock();
            let mut kept = Vec::with_capacity(pending.len());
            for (watched, sender) in pending.drain(..) {
                if watched == cid {
                    // A dropped receiver is a cancelled wait; ignore it.
                    let _ = sender.send(entry.clone());
                } else if !sender.is_canceled() {
                    kept.push((watched, sender));
                }
            }
            *pending = kept;
        }

        Ok(())
    }
}
