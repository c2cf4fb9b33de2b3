// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Message;
use arbor_address::Address;
use arbor_bigint::bigint_ser::{BigIntDe, BigIntSer};
use arbor_encoding::{
    de::{self, Deserializer},
    ser::{self, Serializer},
    Cbor,
};
use arbor_vm::{MethodNum, Serialized, TokenAmount};
use derive_builder::Builder;
use serde::Deserialize;

/// Default unsigned VM message type which includes all data needed for a
/// state transition.
///
/// Usage:
/// ```
/// use arbor_message::{UnsignedMessage, Message};
/// use arbor_vm::{TokenAmount, Serialized};
/// use arbor_address::Address;
///
/// // Use the builder pattern to generate a message
/// let message = UnsignedMessage::builder()
///     .to(Address::new_id(0))
///     .from(Address::new_id(1))
///     .sequence(0) // optional
///     .value(TokenAmount::from(0u8)) // optional
///     .method_num(0) // optional
///     .params(Serialized::default()) // optional
///     .gas_limit(0) // optional
///     .gas_price(TokenAmount::from(0u8)) // optional
///     .build()
///     .unwrap();
/// assert_eq!(message.sequence(), 0);
/// ```
#[derive(PartialEq, Eq, Clone, Debug, Builder, Hash)]
#[builder(name = "MessageBuilder")]
pub struct UnsignedMessage {
    from: Address,
    to: Address,
    #[builder(default)]
    sequence: u64,
    #[builder(default)]
    value: TokenAmount,
    #[builder(default)]
    method_num: MethodNum,
    #[builder(default)]
    params: Serialized,
    #[builder(default)]
    gas_price: TokenAmount,
    #[builder(default)]
    gas_limit: i64,
}

impl UnsignedMessage {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }
}

impl ser::Serialize for UnsignedMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.to,
            &self.from,
            &self.sequence,
            BigIntSer(&self.value),
            BigIntSer(&self.gas_price),
            &self.gas_limit,
            &self.method_num,
            &self.params,
        )
            .serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for UnsignedMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (
            to,
            from,
            sequence,
            BigIntDe(value),
            BigIntDe(gas_price),
            gas_limit,
            method_num,
            params,
        ) = Deserialize::deserialize(deserializer)?;
        Ok(Self {
            from,
            to,
            sequence,
            value,
            method_num,
            params,
            gas_price,
            gas_limit,
        })
    }
}

impl Cbor for UnsignedMessage {}

impl Message for UnsignedMessage {
    fn from(&self) -> &Address {
        &self.from
    }
    fn to(&self) -> &Address {
        &self.to
    }
    fn sequence(&self) -> u64 {
        self.sequence
    }
    fn value(&self) -> &TokenAmount {
        &self.value
    }
    fn method_num(&self) -> MethodNum {
        self.method_num
    }
    fn params(&self) -> &Serialized {
        &self.params
    }
    fn set_gas_limit(&mut self, token_amount: i64) {
        self.gas_limit = token_amount
    }
    fn gas_limit(&self) -> i64 {
        self.gas_limit
    }
    fn gas_price(&self) -> &TokenAmount {
        &self.gas_price
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use arbor_encoding::Cbor;
    use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

    /// Wrapper for serializing and deserializing an UnsignedMessage from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct UnsignedMessageJson(#[serde(with = "self")] pub UnsignedMessage);

    /// Wrapper for serializing an UnsignedMessage reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct UnsignedMessageJsonRef<'a>(#[serde(with = "self")] pub &'a UnsignedMessage);

    impl From<UnsignedMessageJson> for UnsignedMessage {
        fn from(wrapper: UnsignedMessageJson) -> Self {
            wrapper.0
        }
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct JsonHelper {
        #[serde(with = "arbor_address::json")]
        to: arbor_address::Address,
        #[serde(with = "arbor_address::json")]
        from: arbor_address::Address,
        #[serde(rename = "Nonce")]
        sequence: u64,
        #[serde(with = "arbor_bigint::bigint_ser::json")]
        value: TokenAmount,
        gas_limit: i64,
        #[serde(with = "arbor_bigint::bigint_ser::json")]
        gas_price: TokenAmount,
        #[serde(rename = "Method")]
        method_num: u64,
        params: Option<String>,
        #[serde(default, rename = "CID", with = "cid_json_opt")]
        cid: Option<cid::Cid>,
    }

    mod cid_json_opt {
        use arbor_encoding::json::cid::CidJson;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S>(v: &Option<cid::Cid>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.map(CidJson).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<cid::Cid>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let c: Option<CidJson> = Deserialize::deserialize(deserializer)?;
            Ok(c.map(|c| c.0))
        }
    }

    pub fn serialize<S>(m: &UnsignedMessage, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            to: m.to.clone(),
            from: m.from.clone(),
            sequence: m.sequence,
            value: m.value.clone(),
            gas_limit: m.gas_limit,
            gas_price: m.gas_price.clone(),
            method_num: m.method_num,
            params: Some(base64::encode(m.params.bytes())),
            cid: Some(m.cid().map_err(ser::Error::custom)?),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnsignedMessage, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(UnsignedMessage {
            to: m.to,
            from: m.from,
            sequence: m.sequence,
            value: m.value,
            gas_limit: m.gas_limit,
            gas_price: m.gas_price,
            method_num: m.method_num,
            params: arbor_vm::Serialized::new(
                base64::decode(m.params.unwrap_or_default()).map_err(de::Error::custom)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn symmetric_message_encoding() {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(2))
            .from(Address::new_id(3))
            .sequence(20)
            .value(TokenAmount::from_str("100000000000").unwrap())
            .gas_limit(4000)
            .build()
            .unwrap();

        let bz = message.marshal_cbor().unwrap();
        let back = UnsignedMessage::unmarshal_cbor(&bz).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.marshal_cbor().unwrap(), bz);
        assert_eq!(back.cid().unwrap(), message.cid().unwrap());
    }
}
