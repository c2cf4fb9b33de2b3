// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_actor::{init, INIT_ACTOR_ADDR};
use arbor_address::{Address, Protocol};
use arbor_blockstore::BlockStore;
use arbor_hamt::{BytesKey, Hamt};
use arbor_vm::ActorState;
use cid::Cid;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error as StdError;

/// Bit width of the actor map; part of the state root identity.
const HAMT_BIT_WIDTH: u32 = 5;

/// Projection of the actor table over a state root: address to actor record,
/// backed by a HAMT in the content-addressed store. Reads through the same
/// root are consistent; mutations only take effect in the store on `flush`.
pub struct StateTree<'db, S> {
    hamt: Hamt<'db, S, ActorState>,

    /// Cache of the actor records read or written through this view.
    actor_cache: RwLock<HashMap<Address, ActorState>>,
    /// Cache of key address to ID address resolutions.
    resolve_cache: RwLock<HashMap<Address, Address>>,
}

impl<'db, S> StateTree<'db, S>
where
    S: BlockStore,
{
    /// Constructor for a new, empty state tree.
    pub fn new(store: &'db S) -> Self {
        Self {
            hamt: Hamt::new_with_bit_width(store, HAMT_BIT_WIDTH),
            actor_cache: Default::default(),
            resolve_cache: Default::default(),
        }
    }

    /// Constructor for a state tree given an IPLD store and a state root.
    pub fn new_from_root(store: &'db S, root: &Cid) -> Result<Self, Box<dyn StdError>> {
        let hamt = Hamt::load_with_bit_width(root, store, HAMT_BIT_WIDTH)?;
        Ok(Self {
            hamt,
            actor_cache: Default::default(),
            resolve_cache: Default::default(),
        })
    }

    /// Retrieve store reference.
    pub fn store(&self) -> &'db S {
        self.hamt.store()
    }

    /// Get actor state from an address. Will be resolved to ID address.
    pub fn get_actor(&self, addr: &Address) -> Result<Option<ActorState>, Box<dyn StdError>> {
        let addr = match self.lookup_id(addr)? {
            Some(addr) => addr,
            None => return Ok(None),
        };

        // Check cache for actor state
        if let Some(actor_state) = self.actor_cache.read().get(&addr) {
            return Ok(Some(actor_state.clone()));
        }

        // If state doesn't exist, find using hamt
        let act = self.hamt.get(&BytesKey(addr.to_bytes()))?.cloned();

        // Update cache if state was found
        if let Some(act_s) = &act {
            self.actor_cache.write().insert(addr, act_s.clone());
        }

        Ok(act)
    }

    /// Set actor state for an address. Will set state at ID address.
    pub fn set_actor(&mut self, addr: &Address, actor: ActorState) -> Result<(), Box<dyn StdError>> {
        let addr = self
            .lookup_id(addr)?
            .ok_or_else(|| format!("Resolution lookup failed for {}", addr))?;

        self.actor_cache.write().insert(addr.clone(), actor.clone());
        self.hamt.set(BytesKey(addr.to_bytes()), actor)?;
        Ok(())
    }

    /// Get an ID address from any Address.
    pub fn lookup_id(&self, addr: &Address) -> Result<Option<Address>, Box<dyn StdError>> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(addr.clone()));
        }

        if let Some(res_address) = self.resolve_cache.read().get(addr) {
            return Ok(Some(res_address.clone()));
        }

        let init_act = self
            .hamt
            .get(&BytesKey(INIT_ACTOR_ADDR.to_bytes()))?
            .ok_or("Init actor address could not be resolved")?;

        let state: init::State = self
            .store()
            .get(&init_act.state)?
            .ok_or("Could not resolve init actor state")?;

        let a = match state.resolve_address(self.store(), addr)? {
            Some(a) => a,
            None => return Ok(None),
        };

        self.resolve_cache.write().insert(addr.clone(), a.clone());

        Ok(Some(a))
    }

    /// Delete actor for an address. Will resolve to ID address to delete.
    pub fn delete_actor(&mut self, addr: &Address) -> Result<(), Box<dyn StdError>> {
        let addr = self
            .lookup_id(addr)?
            .ok_or_else(|| format!("Resolution lookup failed for {}", addr))?;

        self.actor_cache.write().remove(&addr);
        self.hamt.delete(&BytesKey(addr.to_bytes()))?;

        Ok(())
    }

    /// Register a new address through the init actor.
    pub fn register_new_address(&mut self, addr: &Address) -> Result<Address, Box<dyn StdError>> {
        let mut init_act = self
            .get_actor(&INIT_ACTOR_ADDR)?
            .ok_or("Could not retrieve init actor")?;

        // Get init actor state from store
        let mut ias: init::State = self
            .store()
            .get(&init_act.state)?
            .ok_or("Failed to retrieve init actor state")?;

        // Create new address with init actor state
        let new_addr = ias.map_address_to_new_id(self.store(), addr)?;

        // Set state for init actor in store and update root Cid
        init_act.state = self
            .store()
            .put(&ias, cid::multihash::Code::Blake2b256)?;

        self.set_actor(&INIT_ACTOR_ADDR, init_act)?;

        Ok(new_addr)
    }

    /// Flush state tree and return Cid root.
    pub fn flush(&mut self) -> Result<Cid, Box<dyn StdError>> {
        Ok(self.hamt.flush()?)
    }

    /// Iterates over the actor records in the tree.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), Box<dyn StdError>>
    where
        F: FnMut(Address, &ActorState) -> Result<(), Box<dyn StdError>>,
    {
        self.hamt.for_each(|k, v| {
            let addr = Address::from_bytes(k.as_ref())?;
            f(addr, v)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_actor::{ACCOUNT_ACTOR_CODE_ID, INIT_ACTOR_CODE_ID};
    use arbor_bigint::BigInt;
    use arbor_blockstore::MemoryDB;

    fn empty_actor(code: Cid, state: Cid) -> ActorState {
        ActorState::new(code, state, BigInt::from(0u8), 0)
    }

    #[test]
    fn get_set_roundtrip_through_root() {
        let store = MemoryDB::default();
        let mut tree = StateTree::new(&store);

        let addr = Address::new_id(100);
        let state_cid = store
            .put(&"state", cid::multihash::Code::Blake2b256)
            .unwrap();
        let act = empty_actor(*ACCOUNT_ACTOR_CODE_ID, state_cid);
        tree.set_actor(&addr, act.clone()).unwrap();
        assert_eq!(tree.get_actor(&addr).unwrap(), Some(act.clone()));

        let root = tree.flush().unwrap();
        let tree2 = StateTree::new_from_root(&store, &root).unwrap();
        assert_eq!(tree2.get_actor(&addr).unwrap(), Some(act));
        assert_eq!(tree2.get_actor(&Address::new_id(101)).unwrap(), None);
    }

    #[test]
    fn lookup_id_through_init_actor() {
        let store = MemoryDB::default();
        let mut tree = StateTree::new(&store);

        // Install init actor state
        let init_state = init::State::new(&store, "test".to_string()).unwrap();
        let init_head = store
            .put(&init_state, cid::multihash::Code::Blake2b256)
            .unwrap();
        tree.set_actor(
            &INIT_ACTOR_ADDR,
            empty_actor(*INIT_ACTOR_CODE_ID, init_head),
        )
        .unwrap();

        let key_addr = Address::new_bls(&[7u8; arbor_address::BLS_PUB_LEN]).unwrap();
        // Unmapped key addresses don't resolve
        assert_eq!(tree.lookup_id(&key_addr).unwrap(), None);

        let id_addr = tree.register_new_address(&key_addr).unwrap();
        assert_eq!(id_addr, Address::new_id(100));
        assert_eq!(tree.lookup_id(&key_addr).unwrap(), Some(id_addr));

        // ID addresses resolve to themselves
        let id = Address::new_id(30);
        assert_eq!(tree.lookup_id(&id).unwrap(), Some(id));
    }
}
