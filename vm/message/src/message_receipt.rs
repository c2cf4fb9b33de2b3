// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use arbor_encoding::tuple::*;
use arbor_encoding::Cbor;
use arbor_vm::{ExitCode, Serialized};

/// Result of a state transition from a message.
#[derive(PartialEq, Eq, Clone, Debug, Serialize_tuple, Deserialize_tuple)]
pub struct MessageReceipt {
    pub exit_code: ExitCode,
    pub return_data: Serialized,
    pub gas_used: u64,
}

impl Cbor for MessageReceipt {}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing a MessageReceipt from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct MessageReceiptJson(#[serde(with = "self")] pub MessageReceipt);

    /// Wrapper for serializing a MessageReceipt reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct MessageReceiptJsonRef<'a>(#[serde(with = "self")] pub &'a MessageReceipt);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "ExitCode")]
        exit_code: u64,
        #[serde(rename = "Return")]
        return_data: Option<String>,
        #[serde(rename = "GasUsed")]
        gas_used: u64,
    }

    pub fn serialize<S>(m: &MessageReceipt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            exit_code: m.exit_code as u64,
            return_data: Some(base64::encode(m.return_data.bytes())),
            gas_used: m.gas_used,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<MessageReceipt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(MessageReceipt {
            exit_code: ExitCode::from_u64(m.exit_code)
                .ok_or_else(|| de::Error::custom("unknown exit code"))?,
            return_data: Serialized::new(
                base64::decode(m.return_data.unwrap_or_default()).map_err(de::Error::custom)?,
            ),
            gas_used: m.gas_used,
        })
    }
}
