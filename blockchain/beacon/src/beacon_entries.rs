// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_encoding::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
    BytesDe, BytesSer,
};

/// The result from getting an entry from the external randomness beacon.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BeaconEntry {
    round: u64,
    data: Vec<u8>,
}

impl BeaconEntry {
    pub fn new(round: u64, data: Vec<u8>) -> Self {
        Self { round, data }
    }

    /// Returns the current round number.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// The signature of message `H(prev_round, prev_round.data, round)`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for BeaconEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.round, BytesSer(&self.data)).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BeaconEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        let (round, data): (u64, BytesDe) = Deserialize::deserialize(deserializer)?;
        Ok(Self {
            round,
            data: data.0,
        })
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a BeaconEntry from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct BeaconEntryJson(#[serde(with = "self")] pub BeaconEntry);

    /// Wrapper for serializing a BeaconEntry reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct BeaconEntryJsonRef<'a>(#[serde(with = "self")] pub &'a BeaconEntry);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Round")]
        round: u64,
        #[serde(rename = "Data")]
        data: String,
    }

    pub fn serialize<S>(m: &BeaconEntry, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            round: m.round,
            data: base64::encode(&m.data),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BeaconEntry, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(BeaconEntry {
            round: m.round,
            data: base64::decode(m.data).map_err(de::Error::custom)?,
        })
    }

    pub mod vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S>(m: &[BeaconEntry], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(m.len()))?;
            for e in m {
                seq.serialize_element(&BeaconEntryJsonRef(e))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BeaconEntry>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let entries: Option<Vec<BeaconEntryJson>> = Deserialize::deserialize(deserializer)?;
            Ok(entries
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.0)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_entry_encoding() {
        let entry = BeaconEntry::new(5, vec![1, 2, 3, 4]);
        let bz = serde_cbor::to_vec(&entry).unwrap();
        let back: BeaconEntry = serde_cbor::from_slice(&bz).unwrap();
        assert_eq!(back, entry);
    }
}
