// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{resolve_tipset, rpc_err, RpcState};
use arbor_blocks::header::json::BlockHeaderJson;
use arbor_blocks::tipset::json::keys::TipsetKeysJson;
use arbor_blocks::tipset::json::{TipsetJson, TipsetJsonRef};
use arbor_blocks::BlockHeader;
use arbor_blockstore::BlockStore;
use arbor_chain::{self as chain, weight};
use arbor_clock::ChainEpoch;
use arbor_crypto::DomainSeparationTag;
use arbor_encoding::json::cid::CidJson;
use arbor_message::message_receipt::json::MessageReceiptJson;
use arbor_message::signed_message::json::SignedMessageJson;
use arbor_message::unsigned_message::json::UnsignedMessageJson;
use arbor_message::{ChainMessage, UnsignedMessage};
use jsonrpc_v2::{Data, Error as JsonRpcError, Params};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct BlockMessages {
    #[serde(rename = "BlsMessages")]
    pub bls_msg: Vec<UnsignedMessageJson>,
    #[serde(rename = "SecpkMessages")]
    pub secp_msg: Vec<SignedMessageJson>,
    #[serde(rename = "Cids", with = "arbor_encoding::json::cid::vec")]
    pub cids: Vec<cid::Cid>,
}

pub(crate) async fn chain_head<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
) -> Result<TipsetJson, JsonRpcError> {
    let heaviest = data
        .state_manager
        .chain_store()
        .heaviest_tipset()
        .ok_or("no known head")?;
    Ok(TipsetJson((*heaviest).clone()))
}

pub(crate) async fn chain_get_genesis<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
) -> Result<TipsetJson, JsonRpcError> {
    let genesis = data
        .state_manager
        .chain_store()
        .genesis()
        .map_err(rpc_err)?;
    let ts = arbor_blocks::Tipset::new(vec![genesis]).map_err(rpc_err)?;
    Ok(TipsetJson(ts))
}

pub(crate) async fn chain_get_tipset<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(TipsetKeysJson,)>,
) -> Result<TipsetJson, JsonRpcError> {
    let (TipsetKeysJson(keys),) = params;
    let ts = data
        .state_manager
        .chain_store()
        .tipset_from_keys(&keys)
        .map_err(crate::chain_err)?;
    Ok(TipsetJson((*ts).clone()))
}

pub(crate) async fn chain_get_tipset_by_height<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(ChainEpoch, TipsetKeysJson)>,
) -> Result<TipsetJson, JsonRpcError> {
    let (height, TipsetKeysJson(keys)) = params;
    let from = resolve_tipset(&data, &keys)?;
    let ts = data
        .state_manager
        .chain_store()
        .tipset_by_height(height, Some(from))
        .map_err(rpc_err)?;
    Ok(TipsetJson((*ts).clone()))
}

pub(crate) async fn chain_get_block<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<BlockHeaderJson, JsonRpcError> {
    let (CidJson(blk_cid),) = params;
    let blk: BlockHeader = data
        .state_manager
        .blockstore()
        .get(&blk_cid)
        .map_err(rpc_err)?
        .ok_or("can't find BlockHeader with that cid")?;
    Ok(BlockHeaderJson(blk))
}

pub(crate) async fn chain_get_block_messages<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<BlockMessages, JsonRpcError> {
    let (CidJson(blk_cid),) = params;
    let blk: BlockHeader = data
        .state_manager
        .blockstore()
        .get(&blk_cid)
        .map_err(rpc_err)?
        .ok_or("can't find block with that cid")?;

    let (bls_cids, secp_cids) =
        chain::read_msg_cids(data.state_manager.blockstore(), blk.messages()).map_err(rpc_err)?;
    let (unsigned, signed) =
        chain::block_messages(data.state_manager.blockstore(), &blk).map_err(rpc_err)?;

    let cids = bls_cids.into_iter().chain(secp_cids).collect();
    Ok(BlockMessages {
        bls_msg: unsigned.into_iter().map(UnsignedMessageJson).collect(),
        secp_msg: signed.into_iter().map(SignedMessageJson).collect(),
        cids,
    })
}

pub(crate) async fn chain_get_message<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<UnsignedMessageJson, JsonRpcError> {
    let (CidJson(msg_cid),) = params;
    let ret: UnsignedMessage =
        match chain::get_chain_message(data.state_manager.blockstore(), &msg_cid)
            .map_err(rpc_err)?
        {
            ChainMessage::Signed(m) => m.message().clone(),
            ChainMessage::Unsigned(m) => m,
        };
    Ok(UnsignedMessageJson(ret))
}

pub(crate) async fn chain_get_parent_messages<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<Vec<UnsignedMessageJson>, JsonRpcError> {
    let (CidJson(blk_cid),) = params;
    let store = data.state_manager.blockstore();
    let blk: BlockHeader = store
        .get(&blk_cid)
        .map_err(rpc_err)?
        .ok_or("can't find block with that cid")?;

    if blk.epoch() == 0 {
        return Ok(vec![]);
    }
    let parent = data
        .state_manager
        .chain_store()
        .tipset_from_keys(blk.parents())
        .map_err(rpc_err)?;
    let messages = chain::messages_for_tipset(store, &parent).map_err(rpc_err)?;
    Ok(messages
        .into_iter()
        .map(|m| match m {
            ChainMessage::Signed(m) => UnsignedMessageJson(m.message().clone()),
            ChainMessage::Unsigned(m) => UnsignedMessageJson(m),
        })
        .collect())
}

pub(crate) async fn chain_get_parent_receipts<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(CidJson,)>,
) -> Result<Vec<MessageReceiptJson>, JsonRpcError> {
    let (CidJson(blk_cid),) = params;
    let store = data.state_manager.blockstore();
    let blk: BlockHeader = store
        .get(&blk_cid)
        .map_err(rpc_err)?
        .ok_or("can't find block with that cid")?;

    let receipts = chain::parent_receipts(store, &blk).map_err(rpc_err)?;
    Ok(receipts.into_iter().map(MessageReceiptJson).collect())
}

pub(crate) async fn chain_get_randomness<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(TipsetKeysJson, i64, ChainEpoch, Vec<u8>)>,
) -> Result<[u8; 32], JsonRpcError> {
    let (TipsetKeysJson(keys), tag, epoch, entropy) = params;
    let tag: DomainSeparationTag =
        FromPrimitive::from_i64(tag).ok_or("unknown domain separation tag")?;
    data.state_manager
        .chain_store()
        .get_chain_randomness(&keys, tag, epoch, &entropy)
        .map_err(rpc_err)
}

pub(crate) async fn chain_tipset_weight<DB: BlockStore + Send + Sync + 'static>(
    data: Data<RpcState<DB>>,
    Params(params): Params<(TipsetKeysJson,)>,
) -> Result<String, JsonRpcError> {
    let (TipsetKeysJson(keys),) = params;
    let ts = resolve_tipset(&data, &keys)?;
    let weight = weight(data.state_manager.blockstore(), &ts).map_err(rpc_err)?;
    Ok(weight.to_str_radix(10))
}

/// Serializes one head change batch to its JSON wire form.
pub fn head_change_json(batch: &[arbor_chain::HeadChange]) -> Vec<serde_json::Value> {
    batch
        .iter()
        .map(|change| {
            let (kind, ts) = match change {
                arbor_chain::HeadChange::Current(ts) => ("current", ts),
                arbor_chain::HeadChange::Apply(ts) => ("apply", ts),
                arbor_chain::HeadChange::Revert(ts) => ("revert", ts),
            };
            serde_json::json!({
                "Type": kind,
                "Val": TipsetJsonRef(ts.as_ref()),
            })
        })
        .collect()
}
