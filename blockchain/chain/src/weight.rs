// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::Error;
use arbor_actor::{power, STORAGE_POWER_ACTOR_ADDR};
use arbor_bigint::BigInt;
use arbor_blocks::Tipset;
use arbor_blockstore::BlockStore;
use arbor_state_tree::StateTree;

pub type Weight = BigInt;

const W_RATIO_NUM: u64 = 1;
const W_RATIO_DEN: u64 = 2;
const BLOCKS_PER_EPOCH: u64 = 5;

/// Returns the weight of the given tipset: the parent chain weight plus a
/// power term and a blocks-produced term, both keyed off the total
/// quality-adjusted power at the tipset's parent state.
///
/// Strictly increasing from parent to child; sibling tipsets at the same
/// height with more blocks weigh more. Exact ties are broken outside this
/// function by comparing tipset keys.
pub fn weight<DB>(db: &DB, ts: &Tipset) -> Result<Weight, Error>
where
    DB: BlockStore,
{
    let state = StateTree::new_from_root(db, ts.parent_state())
        .map_err(|e| Error::State(e.to_string()))?;
    let power_actor = state
        .get_actor(&STORAGE_POWER_ACTOR_ADDR)?
        .ok_or_else(|| Error::State("Power actor not found in parent state".to_string()))?;
    let power_state: power::State = db
        .get(&power_actor.state)?
        .ok_or_else(|| Error::State("Power actor state not found in store".to_string()))?;

    let total_power = power_state.total_quality_adj_power;
    let log2_p = if total_power > BigInt::from(0) {
        total_power.bits() - 1
    } else {
        0
    };

    let mut total = ts.weight().clone();
    total += BigInt::from(log2_p) << 8;

    let e_weight = BigInt::from(log2_p * ts.blocks().len() as u64 * W_RATIO_NUM) << 8;
    total += e_weight / (BLOCKS_PER_EPOCH * W_RATIO_DEN);

    Ok(total)
}
