// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod call;
mod errors;
mod waiter;

pub use self::call::*;
pub use self::errors::*;
pub use self::waiter::*;

use arbor_actor::account;
use arbor_address::{Address, Protocol};
use arbor_blocks::{Tipset, TipsetKeys};
use arbor_blockstore::BlockStore;
use arbor_chain::ChainStore;
use arbor_clock::ChainEpoch;
use arbor_message::{Message, MessageReceipt, UnsignedMessage};
use arbor_state_tree::StateTree;
use arbor_vm::{ActorError, ActorState};
use async_std::sync::RwLock;
use cid::Cid;
use futures::channel::oneshot;
use futures::future::Shared;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::sync::Arc;

/// A (state root, receipts root) pair, the result of interpreting a tipset.
pub type CidPair = (Cid, Cid);

/// Result of applying a single message in the interpreter.
#[derive(Clone, Debug)]
pub struct ApplyRet {
    /// Receipt of the message execution.
    pub msg_receipt: MessageReceipt,
    /// Error from the actor the message targeted, if the call aborted.
    pub act_error: Option<ActorError>,
}

/// The state transition function, provided by the consensus/VM layer. Must
/// be a deterministic function of the tipset value and the store content
/// reachable from it.
pub trait Interpreter<DB>: Send + Sync {
    /// Executes all messages of the tipset over its parent state; returns
    /// the post state root and receipts root. The receipts list is indexed
    /// in the tipset's message visit order.
    fn apply_blocks(
        &self,
        db: &DB,
        tipset: &Tipset,
    ) -> Result<CidPair, Box<dyn StdError + Send + Sync>>;

    /// Applies a single implicit (unsigned, no gas charge) message over the
    /// given state root.
    fn apply_implicit_message(
        &self,
        db: &DB,
        msg: &UnsignedMessage,
        state_root: &Cid,
        epoch: ChainEpoch,
    ) -> Result<ApplyRet, Box<dyn StdError + Send + Sync>>;
}

/// Entry in the interpreter result cache: a shared future while the first
/// caller is still computing, the value afterwards.
enum CacheEntry {
    Done(CidPair),
    Pending(Shared<oneshot::Receiver<CidPair>>),
}

/// Intermediary for retrieving state objects and executing state queries at
/// arbitrary tipsets. Interpreter results are cached per tipset key with
/// at-most-once execution under concurrent access.
pub struct StateManager<DB> {
    cs: Arc<ChainStore<DB>>,
    interpreter: Arc<dyn Interpreter<DB>>,
    cache: RwLock<HashMap<TipsetKeys, CacheEntry>>,
}

impl<DB> StateManager<DB>
where
    DB: BlockStore,
{
    pub fn new(cs: Arc<ChainStore<DB>>, interpreter: Arc<dyn Interpreter<DB>>) -> Self {
        Self {
            cs,
            interpreter,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the chain store the manager queries against.
    pub fn chain_store(&self) -> &Arc<ChainStore<DB>> {
        &self.cs
    }

    /// Returns the backing blockstore.
    pub fn blockstore(&self) -> &DB {
        self.cs.blockstore()
    }

    pub(crate) fn interpreter(&self) -> &Arc<dyn Interpreter<DB>> {
        &self.interpreter
    }

    /// Returns the post state root and receipts root of the given tipset,
    /// computing them through the interpreter if no cached value exists.
    /// Concurrent callers for the same key await one shared computation; a
    /// failed computation is evicted so later callers can retry.
    pub async fn tipset_state(&self, tipset: &Tipset) -> Result<CidPair, Error> {
        enum Role {
            Value(CidPair),
            Waiter(Shared<oneshot::Receiver<CidPair>>),
            Computer(oneshot::Sender<CidPair>),
        }

        let role = {
            let mut cache = self.cache.write().await;
            match cache.get(tipset.key()) {
                Some(CacheEntry::Done(value)) => Role::Value(*value),
                Some(CacheEntry::Pending(pending)) => Role::Waiter(pending.clone()),
                None => {
                    let (sender, receiver) = oneshot::channel();
                    cache.insert(tipset.key().clone(), CacheEntry::Pending(receiver.shared()));
                    Role::Computer(sender)
                }
            }
        };

        match role {
            Role::Value(value) => Ok(value),
            Role::Waiter(pending) => pending.await.map_err(|_| {
                // The computing caller dropped the sender on failure.
                Error::Other("tipset state computation failed, retry".to_string())
            }),
            Role::Computer(sender) => {
                let result = self.interpreter.apply_blocks(self.blockstore(), tipset);
                let mut cache = self.cache.write().await;
                match result {
                    Ok(value) => {
                        cache.insert(tipset.key().clone(), CacheEntry::Done(value));
                        let _ = sender.send(value);
                        Ok(value)
                    }
                    Err(e) => {
                        cache.remove(tipset.key());
                        drop(sender);
                        Err(Error::Other(e.to_string()))
                    }
                }
            }
        }
    }

    /// Gets actor state from the state tree rooted at the given state root.
    pub fn get_actor(&self, addr: &Address, state_root: &Cid) -> Result<Option<ActorState>, Error> {
        let state = StateTree::new_from_root(self.blockstore(), state_root)
            .map_err(|e| Error::State(e.to_string()))?;
        state.get_actor(addr).map_err(|e| Error::State(e.to_string()))
    }

    /// Gets actor state as observed at the given tipset.
    pub fn get_actor_at(&self, addr: &Address, ts: &Tipset) -> Result<Option<ActorState>, Error> {
        self.get_actor(addr, ts.parent_state())
    }

    /// Loads and decodes the typed state blob of an actor.
    pub fn load_actor_state<D>(&self, addr: &Address, state_root: &Cid) -> Result<D, Error>
    where
        D: DeserializeOwned,
    {
        let actor = self
            .get_actor(addr, state_root)?
            .ok_or_else(|| Error::ActorNotFound(addr.to_string()))?;
        self.blockstore()
            .get(&actor.state)?
            .ok_or_else(|| Error::ActorStateNotFound(actor.state.to_string()))
    }

    /// Returns the actor record together with the raw bytes of its state
    /// blob at the given tipset.
    pub fn read_state(&self, addr: &Address, ts: &Tipset) -> Result<(ActorState, Vec<u8>), Error> {
        let actor = self
            .get_actor_at(addr, ts)?
            .ok_or_else(|| Error::ActorNotFound(addr.to_string()))?;
        let blob = self
            .blockstore()
            .get_bytes(&actor.state)?
            .ok_or_else(|| Error::ActorStateNotFound(actor.state.to_string()))?;
        Ok((actor, blob))
    }

    /// Resolves the address to its ID form at the given tipset.
    pub fn lookup_id(&self, addr: &Address, ts: &Tipset) -> Result<Option<Address>, Error> {
        let state = StateTree::new_from_root(self.blockstore(), ts.parent_state())
            .map_err(|e| Error::State(e.to_string()))?;
        state
            .lookup_id(addr)
            .map_err(|e| Error::State(e.to_string()))
    }

    /// Resolves the address to its key form (public key or BLS public key
    /// hash) at the given tipset, following the account actor state for ID
    /// addresses.
    pub fn resolve_to_key_addr(&self, addr: &Address, ts: &Tipset) -> Result<Address, Error> {
        if addr.protocol() == Protocol::BLS || addr.protocol() == Protocol::Secp256k1 {
            return Ok(addr.clone());
        }

        let account_state: account::State = self.load_actor_state(addr, ts.parent_state())?;
        Ok(account_state.address)
    }

    /// Lists the addresses of every actor present at the given tipset.
    pub fn list_actors(&self, ts: &Tipset) -> Result<Vec<Address>, Error> {
        let state = StateTree::new_from_root(self.blockstore(), ts.parent_state())
            .map_err(|e| Error::State(e.to_string()))?;
        let mut out = Vec::new();
        state
            .for_each(|addr, _| {
                out.push(addr);
                Ok(())
            })
            .map_err(|e| Error::State(e.to_string()))?;
        Ok(out)
    }

    /// Returns the cids of messages matching the `from`/`to` filter, walking
    /// parents from the given tipset down to `to_height`. Messages are
    /// deduplicated within each tipset of the walk, not across the walk.
    pub fn list_messages(
        &self,
        ts: &Arc<Tipset>,
        from: Option<&Address>,
        to: Option<&Address>,
        to_height: ChainEpoch,
    ) -> Result<Vec<Cid>, Error> {
        if from.is_none() && to.is_none() {
            return Err(Error::Other(
                "must specify at least one of from or to".to_string(),
            ));
        }

        let mut out = Vec::new();
        let mut cur = ts.clone();
        loop {
            // visibility window for duplicates is a single tipset
            let mut visited: HashSet<Cid> = HashSet::new();
            for msg in arbor_chain::messages_for_tipset(self.blockstore(), &cur)? {
                let matches_from = from.map_or(true, |f| msg.from() == f);
                let matches_to = to.map_or(true, |t| msg.to() == t);
                if matches_from && matches_to {
                    let cid = msg.cid()?;
                    if visited.insert(cid) {
                        out.push(cid);
                    }
                }
            }

            if cur.epoch() == 0 || cur.epoch() <= to_height {
                break;
            }
            cur = self.cs.tipset_from_keys(cur.parents())?;
        }
        Ok(out)
    }
}
