// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_crypto::VRFProof;
use arbor_encoding::tuple::*;

/// Proof of a winning leader election; carried opaquely by the chain core,
/// validated by the consensus layer.
#[derive(Clone, Debug, PartialEq, Eq, Default, Hash, Serialize_tuple, Deserialize_tuple)]
pub struct ElectionProof {
    /// Number of reward units won in this round.
    pub win_count: i64,
    /// A proof output by running a VRF on the election randomness.
    pub vrfproof: VRFProof,
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing an ElectionProof from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct ElectionProofJson(#[serde(with = "self")] pub ElectionProof);

    /// Wrapper for serializing an ElectionProof reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct ElectionProofJsonRef<'a>(#[serde(with = "self")] pub &'a ElectionProof);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "WinCount")]
        win_count: i64,
        #[serde(rename = "VRFProof")]
        vrfproof: String,
    }

    pub fn serialize<S>(m: &ElectionProof, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            win_count: m.win_count,
            vrfproof: base64::encode(m.vrfproof.as_bytes()),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ElectionProof, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(ElectionProof {
            win_count: m.win_count,
            vrfproof: VRFProof::new(base64::decode(m.vrfproof).map_err(de::Error::custom)?),
        })
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<ElectionProof>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref().map(ElectionProofJsonRef).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ElectionProof>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<ElectionProofJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}
