// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Read-only JSON-RPC surface over the chain store and state manager. This
//! crate builds the method router; mounting it on an HTTP or websocket
//! transport is left to the daemon.

mod chain_api;
mod data_types;
mod state_api;

pub use self::chain_api::{head_change_json, BlockMessages};
pub use self::data_types::RpcState;
pub use self::state_api::{ActorStateRead, InvocResultJson, MessageFilter, MsgLookup};

use arbor_blocks::{Tipset, TipsetKeys};
use arbor_blockstore::BlockStore;
use jsonrpc_v2::{Data, Error as JsonRpcError, MapRouter, Server};
use std::sync::Arc;

pub(crate) fn rpc_err(e: impl std::fmt::Display) -> JsonRpcError {
    JsonRpcError::from(e.to_string())
}

/// Maps chain errors to responses; tipset construction failures carry their
/// numeric wire category as the error code.
pub(crate) fn chain_err(e: arbor_chain::Error) -> JsonRpcError {
    if let arbor_chain::Error::Blockchain(be) = &e {
        if let Some(code) = be.wire_code() {
            return JsonRpcError::Full {
                code: code as i64,
                message: be.to_string(),
                data: None,
            };
        }
    }
    rpc_err(e)
}

/// Resolves the tipset a query addresses: the named tipset, or the current
/// head when the key is empty.
pub(crate) fn resolve_tipset<DB: BlockStore>(
    state: &RpcState<DB>,
    keys: &TipsetKeys,
) -> Result<Arc<Tipset>, JsonRpcError> {
    if keys.cids().is_empty() {
        state
            .state_manager
            .chain_store()
            .heaviest_tipset()
            .ok_or_else(|| rpc_err("no known head"))
    } else {
        state
            .state_manager
            .chain_store()
            .tipset_from_keys(keys)
            .map_err(chain_err)
    }
}

/// Builds the RPC method router over the given state.
pub fn build_rpc<DB>(state: RpcState<DB>) -> Arc<Server<MapRouter>>
where
    DB: BlockStore + Send + Sync + 'static,
{
    Server::new()
        .with_data(Data::new(state))
        // chain namespace
        .with_method("Filecoin.ChainHead", chain_api::chain_head::<DB>)
        .with_method("Filecoin.ChainGetGenesis", chain_api::chain_get_genesis::<DB>)
        .with_method("Filecoin.ChainGetTipSet", chain_api::chain_get_tipset::<DB>)
        .with_method(
            "Filecoin.ChainGetTipSetByHeight",
            chain_api::chain_get_tipset_by_height::<DB>,
        )
        .with_method("Filecoin.ChainGetBlock", chain_api::chain_get_block::<DB>)
        .with_method(
            "Filecoin.ChainGetBlockMessages",
            chain_api::chain_get_block_messages::<DB>,
        )
        .with_method("Filecoin.ChainGetMessage", chain_api::chain_get_message::<DB>)
        .with_method(
            "Filecoin.ChainGetParentMessages",
            chain_api::chain_get_parent_messages::<DB>,
        )
        .with_method(
            "Filecoin.ChainGetParentReceipts",
            chain_api::chain_get_parent_receipts::<DB>,
        )
        .with_method(
            "Filecoin.ChainGetRandomness",
            chain_api::chain_get_randomness::<DB>,
        )
        .with_method(
            "Filecoin.ChainTipSetWeight",
            chain_api::chain_tipset_weight::<DB>,
        )
        // state namespace
        .with_method("Filecoin.StateGetActor", state_api::state_get_actor::<DB>)
        .with_method("Filecoin.StateReadState", state_api::state_read_state::<DB>)
        .with_method("Filecoin.StateAccountKey", state_api::state_account_key::<DB>)
        .with_method("Filecoin.StateLookupID", state_api::state_lookup_id::<DB>)
        .with_method("Filecoin.StateListActors", state_api::state_list_actors::<DB>)
        .with_method(
            "Filecoin.StateListMessages",
            state_api::state_list_messages::<DB>,
        )
        .with_method("Filecoin.StateCall", state_api::state_call::<DB>)
        .with_method("Filecoin.StateWaitMsg", state_api::state_wait_msg::<DB>)
        .finish()
}
