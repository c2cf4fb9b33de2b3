// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! JSON wrappers for types that have a different wire form over JSON-RPC
//! than over CBOR.

pub mod cid {
    use ::cid::Cid;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    /// Wrapper for serializing and deserializing a Cid from JSON.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
    #[serde(transparent)]
    pub struct CidJson(#[serde(with = "self")] pub Cid);

    /// Wrapper for serializing a Cid reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct CidJsonRef<'a>(#[serde(with = "self")] pub &'a Cid);

    impl From<CidJson> for Cid {
        fn from(wrapper: CidJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    struct CidJsonHelper {
        #[serde(rename = "/")]
        cid: String,
    }

    pub fn serialize<S>(c: &Cid, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        CidJsonHelper { cid: c.to_string() }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Cid, D::Error>
    where
        D: Deserializer<'de>,
    {
        let helper: CidJsonHelper = Deserialize::deserialize(deserializer)?;
        Cid::from_str(&helper.cid).map_err(de::Error::custom)
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[Cid], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&CidJsonRef(e))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Cid>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let cids: Option<Vec<CidJson>> = Deserialize::deserialize(deserializer)?;
            Ok(cids
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.0)
                .collect())
        }
    }
}
