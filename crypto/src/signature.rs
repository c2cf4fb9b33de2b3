// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Signature variants for block and message signing.
#[derive(Clone, Debug, PartialEq, FromPrimitive, Copy, Eq, Hash)]
#[repr(u8)]
pub enum SignatureType {
    Secp256k1 = 1,
    BLS = 2,
}

impl SignatureType {
    pub fn from_byte(b: u8) -> Option<SignatureType> {
        FromPrimitive::from_u8(b)
    }
}

/// A cryptographic signature, carried opaquely by the chain core.
/// Verification belongs to the consensus layer and is not done here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    sig_type: SignatureType,
    bytes: Vec<u8>,
}

impl Signature {
    pub fn new_secp256k1(bytes: Vec<u8>) -> Self {
        Self {
            sig_type: SignatureType::Secp256k1,
            bytes,
        }
    }

    pub fn new_bls(bytes: Vec<u8>) -> Self {
        Self {
            sig_type: SignatureType::BLS,
            bytes,
        }
    }

    /// Returns reference to the signature bytes, without the type prefix.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the signature variant.
    pub fn signature_type(&self) -> SignatureType {
        self.sig_type
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut bytes = Vec::with_capacity(self.bytes.len() + 1);
        // Insert signature type byte
        bytes.push(self.sig_type as u8);
        bytes.extend_from_slice(&self.bytes);

        serde_bytes::Serialize::serialize(&bytes, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = serde_bytes::Deserialize::deserialize(deserializer)?;
        if bytes.is_empty() {
            return Err(de::Error::custom("Cannot deserialize empty signature"));
        }
        let sig_type = SignatureType::from_byte(bytes[0])
            .ok_or_else(|| de::Error::custom(format!("Invalid signature type byte {}", bytes[0])))?;
        Ok(Signature {
            sig_type,
            bytes: bytes[1..].to_vec(),
        })
    }
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;

    /// Wrapper for serializing and deserializing a Signature from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SignatureJson(#[serde(with = "self")] pub Signature);

    /// Wrapper for serializing a Signature reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct SignatureJsonRef<'a>(#[serde(with = "self")] pub &'a Signature);

    #[derive(Serialize, Deserialize)]
    struct JsonHelper {
        #[serde(rename = "Type")]
        sig_type: u8,
        #[serde(rename = "Data")]
        bytes: String,
    }

    pub fn serialize<S>(m: &Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonHelper {
            sig_type: m.sig_type as u8,
            bytes: base64::encode(&m.bytes),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m: JsonHelper = Deserialize::deserialize(deserializer)?;
        Ok(Signature {
            sig_type: SignatureType::from_byte(m.sig_type)
                .ok_or_else(|| de::Error::custom("Invalid signature type"))?,
            bytes: base64::decode(m.bytes).map_err(de::Error::custom)?,
        })
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S>(v: &Option<Signature>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            v.as_ref().map(SignatureJsonRef).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Signature>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<SignatureJson> = Deserialize::deserialize(deserializer)?;
            Ok(s.map(|v| v.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_cbor_roundtrip() {
        let sig = Signature::new_bls(vec![7, 8, 9]);
        let bz = serde_cbor::to_vec(&sig).unwrap();
        let back: Signature = serde_cbor::from_slice(&bz).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn invalid_type_byte_rejected() {
        // Byte string of [9, 1, 2]: 9 is not a valid signature type
        let bz = serde_cbor::to_vec(&serde_bytes::ByteBuf::from(vec![9u8, 1, 2])).unwrap();
        let res: Result<Signature, _> = serde_cbor::from_slice(&bz);
        assert!(res.is_err());
    }
}
