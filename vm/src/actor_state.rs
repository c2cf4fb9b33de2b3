// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::TokenAmount;
use arbor_bigint::bigint_ser;
use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;
use cid::Cid;

/// State record of all actor implementations: the actor's class, its state
/// head, its call sequence and its balance.
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct ActorState {
    /// Link to code for the actor.
    pub code: Cid,
    /// Link to the state of the actor.
    pub state: Cid,
    /// Sequence of the actor.
    pub sequence: u64,
    /// Tokens available to the actor.
    #[serde(with = "bigint_ser")]
    pub balance: TokenAmount,
}

impl Cbor for ActorState {}

impl ActorState {
    /// Constructor for actor state
    pub fn new(code: Cid, state: Cid, balance: TokenAmount, sequence: u64) -> Self {
        Self {
            code,
            state,
            sequence,
            balance,
        }
    }

    /// Safely deducts funds from an Actor
    pub fn deduct_funds(&mut self, amt: &TokenAmount) -> Result<(), String> {
        if &self.balance < amt {
            return Err("Not enough funds".to_owned());
        }
        self.balance -= amt;

        Ok(())
    }

    /// Deposits funds to an Actor
    pub fn deposit_funds(&mut self, amt: &TokenAmount) {
        self.balance += amt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_encoding::Cbor;

    #[test]
    fn symmetric_actor_state_encoding() {
        let state = ActorState::new(
            Cid::default(),
            Cid::default(),
            TokenAmount::from(5000u64),
            3,
        );
        let bz = state.marshal_cbor().unwrap();
        let decoded = ActorState::unmarshal_cbor(&bz).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.marshal_cbor().unwrap(), bz);
    }

    #[test]
    fn balance_accounting() {
        let mut state = ActorState::new(
            Cid::default(),
            Cid::default(),
            TokenAmount::from(10u8),
            0,
        );
        state.deposit_funds(&TokenAmount::from(5u8));
        assert_eq!(state.balance, TokenAmount::from(15u8));
        state.deduct_funds(&TokenAmount::from(15u8)).unwrap();
        assert!(state.deduct_funds(&TokenAmount::from(1u8)).is_err());
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    /// Wrapper for serializing and deserializing an ActorState from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct ActorStateJson(#[serde(with = "self")] pub ActorState);

    /// Wrapper for serializing an ActorState reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct ActorStateJsonRef<'a>(#[serde(with = "self")] pub &'a ActorState);

    impl From<ActorStateJson> for ActorState {
        fn from(wrapper: ActorStateJson) -> Self {
            wrapper.0
        }
    }

    pub fn serialize<S>(m: &ActorState, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct ActorStateSer<'a> {
            #[serde(with = "arbor_encoding::json::cid")]
            pub code: &'a Cid,
            #[serde(rename = "Head", with = "arbor_encoding::json::cid")]
            pub state: &'a Cid,
            #[serde(rename = "Nonce")]
            pub sequence: u64,
            pub balance: String,
        }
        ActorStateSer {
            code: &m.code,
            state: &m.state,
            sequence: m.sequence,
            balance: m.balance.to_str_radix(10),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ActorState, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct ActorStateDe {
            #[serde(with = "arbor_encoding::json::cid")]
            pub code: Cid,
            #[serde(rename = "Head", with = "arbor_encoding::json::cid")]
            pub state: Cid,
            #[serde(rename = "Nonce")]
            pub sequence: u64,
            pub balance: String,
        }
        let ActorStateDe {
            code,
            state,
            sequence,
            balance,
        } = Deserialize::deserialize(deserializer)?;
        Ok(ActorState {
            code,
            state,
            sequence,
            balance: TokenAmount::from_str(&balance).map_err(de::Error::custom)?,
        })
    }
}
