// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_bigint::{bigint_ser, BigInt};
use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;

/// Subset of the storage power actor state the chain core reads: aggregate
/// network power, which the weight function keys off.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    #[serde(with = "bigint_ser")]
    pub total_raw_byte_power: BigInt,
    #[serde(with = "bigint_ser")]
    pub total_quality_adj_power: BigInt,
    pub miner_count: u64,
}

impl Cbor for State {}

impl State {
    pub fn new(total_raw_byte_power: BigInt, total_quality_adj_power: BigInt) -> Self {
        Self {
            total_raw_byte_power,
            total_quality_adj_power,
            miner_count: 0,
        }
    }
}
