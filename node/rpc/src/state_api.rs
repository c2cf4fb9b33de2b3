// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{resolve_tipset, rpc_err, RpcState};
use arbor_address::json::AddressJson;
use arbor_address::Address;
use arbor_blocks::tipset::json::keys::TipsetKeysJson;
use arbor_blockstore::BlockStore;
use arbor_clock::ChainEpoch;
use arbor_encoding::json::cid::CidJson;
use arbor_message::message_receipt::json::MessageReceiptJson;
use arbor_message::unsigned_message::json::UnsignedMessageJson;
use arbor_vm::json::ActorStateJson;
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};
use serde::{Deserialize, Serialize};

/// Filter over message senders and recipients; at least one side must be
/// present.
#[derive(Serialize, Deserialize, Default)]
pub struct MessageFilter {
    #[serde(rename = "From", default, with = "address_opt")]
    pub from: Option<Address>,
    #[serde(rename = "To", default, with = "address_opt")]
    pub to: Option<Address>,
}

mod address_opt {
    use super::*;
    use arbor_address::json::{AddressJson, AddressJsonRef};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        v.as_ref().map(AddressJsonRef).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr: Option<AddressJson> = Deserialize::deserialize(deserializer)?;
        Ok(addr.map(|a| a.0))
    }
}

/// Actor record plus the raw state blob it points at.
#[derive(Serialize)]
pub struct ActorStateRead {
    #[serde(rename = "Actor")]
    pub actor: ActorStateJson,
    #[serde(rename = "State")]
    pub state: String,
}

/// Result of a read-only call.
#[derive(Serialize)]
pub struct InvocResultJson {
    #[serde(rename = "Msg")]
    pub msg: UnsignedMessageJson,
    #[serde(rename = "MsgRct")]
    pub msg_rct: Option<MessageReceiptJson>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Receipt and tipset a waited-for message landed in.
#[derive(Serialize)]
pub struct MsgLookup {
    #[serde(rename = "Receipt")]
    pub receipt: MessageReceiptJson,
    #[serde(rename = "TipSet")]
    pub tipset: TipsetKeysJson,
}

pub(crate) async fn state_get_actor<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(AddressJson, TipsetKeysJson)>,
) -> Result<Option<ActorStateJson>, JsonRpcError> {
    let (AddressJson(addr), TipsetKeysJson(keys)) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let actor = data
        .state_manager
        .get_actor_at(&addr, &ts)
        .map_err(rpc_err)?;
    Ok(actor.map(ActorStateJson))
}

pub(crate) async fn state_read_state<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(AddressJson, TipsetKeysJson)>,
) -> Result<ActorStateRead, JsonRpcError> {
    let (AddressJson(addr), TipsetKeysJson(keys)) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let (actor, blob) = data.state_manager.read_state(&addr, &ts).map_err(rpc_err)?;
    Ok(ActorStateRead {
        actor: ActorStateJson(actor),
        state: base64::encode(blob),
    })
}

pub(crate) async fn state_account_key<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(AddressJson, TipsetKeysJson)>,
) -> Result<AddressJson, JsonRpcError> {
    let (AddressJson(addr), TipsetKeysJson(keys)) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let key_addr = data
        .state_manager
        .resolve_to_key_addr(&addr, &ts)
        .map_err(rpc_err)?;
    Ok(AddressJson(key_addr))
}

pub(crate) async fn state_lookup_id<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(AddressJson, TipsetKeysJson)>,
) -> Result<Option<AddressJson>, JsonRpcError> {
    let (AddressJson(addr), TipsetKeysJson(keys)) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let id = data
        .state_manager
        .lookup_id(&addr, &ts)
        .map_err(rpc_err)?;
    Ok(id.map(AddressJson))
}

pub(crate) async fn state_list_actors<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(TipsetKeysJson,)>,
) -> Result<Vec<AddressJson>, JsonRpcError> {
    let (TipsetKeysJson(keys),) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let actors = data.state_manager.list_actors(&ts).map_err(rpc_err)?;
    Ok(actors.into_iter().map(AddressJson).collect())
}

pub(crate) async fn state_list_messages<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(MessageFilter, TipsetKeysJson, ChainEpoch)>,
) -> Result<Vec<CidJson>, JsonRpcError> {
    let (filter, TipsetKeysJson(keys), to_height) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let cids = data
        .state_manager
        .list_messages(&ts, filter.from.as_ref(), filter.to.as_ref(), to_height)
        .map_err(rpc_err)?;
    Ok(cids.into_iter().map(CidJson).collect())
}

pub(crate) async fn state_call<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(UnsignedMessageJson, TipsetKeysJson)>,
) -> Result<InvocResultJson, JsonRpcError> {
    let (UnsignedMessageJson(mut msg), TipsetKeysJson(keys)) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let ret = data
        .state_manager
        .call(&mut msg, Some(ts))
        .map_err(rpc_err)?;
    Ok(InvocResultJson {
        msg: UnsignedMessageJson(ret.msg),
        msg_rct: ret.msg_rct.map(MessageReceiptJson),
        error: ret.error,
    })
}

pub(crate) async fn state_wait_msg<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<MsgLookup, JsonRpcError> {
    let (CidJson(msg_cid),) = params;
    let (receipt, tipset) = data
        .message_waiter
        .wait(msg_cid)
        .await
        .map_err(rpc_err)?;
    Ok(MsgLookup {
        receipt: MessageReceiptJson(receipt),
        tipset: TipsetKeysJson(tipset),
    })
}
