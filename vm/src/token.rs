// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_bigint::BigInt;

/// Token amount in attoFIL-style base units; value semantics, arbitrary
/// precision.
pub type TokenAmount = BigInt;
