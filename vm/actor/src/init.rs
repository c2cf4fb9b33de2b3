// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_address::{Address, Protocol};
use arbor_blockstore::BlockStore;
use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;
use arbor_hamt::{BytesKey, Hamt};
use cid::Cid;
use std::error::Error as StdError;

/// State of the init actor: the map from key addresses to assigned actor
/// IDs, and the counter the next ID is drawn from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub address_map: Cid,
    pub next_id: u64,
    pub network_name: String,
}

impl Cbor for State {}

impl State {
    pub fn new<BS: BlockStore>(store: &BS, network_name: String) -> Result<Self, Box<dyn StdError>> {
        let empty_map = Hamt::<_, u64>::new(store).flush()?;
        Ok(Self {
            address_map: empty_map,
            // IDs below 100 are reserved for system actors
            next_id: 100,
            network_name,
        })
    }

    /// Allocates a new ID address and stores a mapping of the argument
    /// address to it.
    pub fn map_address_to_new_id<BS: BlockStore>(
        &mut self,
        store: &BS,
        addr: &Address,
    ) -> Result<Address, Box<dyn StdError>> {
        let id = self.next_id;
        self.next_id += 1;

        let mut map: Hamt<BS, u64> = Hamt::load(&self.address_map, store)?;
        map.set(BytesKey(addr.to_bytes()), id)?;
        self.address_map = map.flush()?;

        Ok(Address::new_id(id))
    }

    /// Resolves an address to an ID address, if the argument was mapped
    /// through this actor. ID addresses resolve to themselves.
    pub fn resolve_address<BS: BlockStore>(
        &self,
        store: &BS,
        addr: &Address,
    ) -> Result<Option<Address>, Box<dyn StdError>> {
        if addr.protocol() == Protocol::ID {
            return Ok(Some(addr.clone()));
        }

        let map: Hamt<BS, u64> = Hamt::load(&self.address_map, store)?;
        Ok(map
            .get(&BytesKey(addr.to_bytes()))?
            .copied()
            .map(Address::new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_blockstore::MemoryDB;

    #[test]
    fn assigns_sequential_ids() {
        let store = MemoryDB::default();
        let mut state = State::new(&store, "unit".to_string()).unwrap();

        let a = Address::new_actor(b"one").unwrap();
        let b = Address::new_actor(b"two").unwrap();
        assert_eq!(
            state.map_address_to_new_id(&store, &a).unwrap(),
            Address::new_id(100)
        );
        assert_eq!(
            state.map_address_to_new_id(&store, &b).unwrap(),
            Address::new_id(101)
        );

        assert_eq!(
            state.resolve_address(&store, &a).unwrap(),
            Some(Address::new_id(100))
        );
        assert_eq!(state.resolve_address(&store, &Address::new_actor(b"three").unwrap()).unwrap(), None);
        // id addresses resolve to themselves
        let id = Address::new_id(7);
        assert_eq!(state.resolve_address(&store, &id).unwrap(), Some(id));
    }
}
