// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod network;
mod protocol;

pub use self::errors::Error;
pub use self::network::Network;
pub use self::protocol::Protocol;

use arbor_encoding::blake2b_variable;
use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use once_cell::sync::OnceCell;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Hash length of payload for Secp and Actor addresses.
pub const PAYLOAD_HASH_LEN: usize = 20;

/// Uncompressed secp public key used for validation of Secp addresses.
pub const SECP_PUB_LEN: usize = 65;

/// BLS public key length used for validation of BLS addresses.
pub const BLS_PUB_LEN: usize = 48;

/// Length of the checksum hash for string encodings.
pub const CHECKSUM_HASH_LEN: usize = 4;

/// Maximum length of the string form of an address.
const MAX_ADDRESS_LEN: usize = 84 + 2;

/// Network to use when encoding addresses to strings; set once at startup.
pub static NETWORK_DEFAULT: OnceCell<Network> = OnceCell::new();

const ADDRESS_ENCODER: Encoding = new_encoding! {
    symbols: "abcdefghijklmnopqrstuvwxyz234567",
    padding: None,
};

/// Address of an actor: an ID assigned by the init actor, or a key form
/// (a public key hash or a full BLS public key). The CBOR form is the
/// protocol byte followed by the payload.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address {
    protocol: Protocol,
    payload: Vec<u8>,
}

impl Address {
    /// Address constructor, validates the payload for the given protocol.
    fn new(protocol: Protocol, payload: Vec<u8>) -> Result<Self, Error> {
        match protocol {
            Protocol::ID => {
                let mut reader = std::io::Cursor::new(&payload);
                leb128::read::unsigned(&mut reader).map_err(|_| Error::InvalidAddressIDPayload)?;
                if reader.position() as usize != payload.len() {
                    return Err(Error::InvalidAddressIDPayload);
                }
            }
            Protocol::Secp256k1 | Protocol::Actor => {
                if payload.len() != PAYLOAD_HASH_LEN {
                    return Err(Error::InvalidPayloadLength(PAYLOAD_HASH_LEN, payload.len()));
                }
            }
            Protocol::BLS => {
                if payload.len() != BLS_PUB_LEN {
                    return Err(Error::InvalidPayloadLength(BLS_PUB_LEN, payload.len()));
                }
            }
        }
        Ok(Self { protocol, payload })
    }

    /// Generates a new address using the ID protocol.
    pub fn new_id(id: u64) -> Self {
        let mut payload = Vec::new();
        leb128::write::unsigned(&mut payload, id).expect("write to vec cannot fail");
        Self {
            protocol: Protocol::ID,
            payload,
        }
    }

    /// Generates a new address using the Secp256k1 protocol.
    pub fn new_secp256k1(pubkey: &[u8]) -> Result<Self, Error> {
        if pubkey.len() != SECP_PUB_LEN {
            return Err(Error::InvalidSECPLength(pubkey.len()));
        }
        Self::new(Protocol::Secp256k1, address_hash(pubkey))
    }

    /// Generates a new address using the Actor protocol.
    pub fn new_actor(data: &[u8]) -> Result<Self, Error> {
        Self::new(Protocol::Actor, address_hash(data))
    }

    /// Generates a new address using the BLS protocol.
    pub fn new_bls(pubkey: &[u8]) -> Result<Self, Error> {
        if pubkey.len() != BLS_PUB_LEN {
            return Err(Error::InvalidBLSLength(pubkey.len()));
        }
        Self::new(Protocol::BLS, pubkey.to_vec())
    }

    /// Returns protocol for the address.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the raw payload of the address, without the protocol byte.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the actor ID of an ID address.
    pub fn id(&self) -> Result<u64, Error> {
        if self.protocol != Protocol::ID {
            return Err(Error::NonIDAddress);
        }
        let mut reader = std::io::Cursor::new(&self.payload);
        leb128::read::unsigned(&mut reader).map_err(|_| Error::InvalidAddressIDPayload)
    }

    /// Returns encoded bytes of Address: the protocol byte then the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bz = Vec::with_capacity(self.payload.len() + 1);
        bz.push(self.protocol as u8);
        bz.extend_from_slice(&self.payload);
        bz
    }

    /// Decodes an address from its byte form.
    pub fn from_bytes(bz: &[u8]) -> Result<Self, Error> {
        if bz.len() < 2 {
            return Err(Error::InvalidLength);
        }
        let protocol = Protocol::from_byte(bz[0]).ok_or(Error::UnknownProtocol)?;
        Self::new(protocol, bz[1..].to_vec())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let network = NETWORK_DEFAULT.get_or_init(Network::default);
        write!(f, "{}{}", network.to_prefix(), self.protocol)?;
        match self.protocol {
            Protocol::ID => {
                // Payload of an ID address is always a valid varint.
                write!(f, "{}", self.id().map_err(|_| fmt::Error)?)
            }
            Protocol::Secp256k1 | Protocol::Actor | Protocol::BLS => {
                let mut ingest = self.payload.clone();
                ingest.extend_from_slice(&checksum(&self.to_bytes()));
                write!(f, "{}", ADDRESS_ENCODER.encode(&ingest))
            }
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(addr: &str) -> Result<Self, Error> {
        if addr.len() > MAX_ADDRESS_LEN || addr.len() < 3 || !addr.is_ascii() {
            return Err(Error::InvalidLength);
        }
        match &addr[0..1] {
            network::MAINNET_PREFIX | network::TESTNET_PREFIX => (),
            _ => return Err(Error::UnknownNetwork),
        }
        let protocol = match &addr[1..2] {
            "0" => Protocol::ID,
            "1" => Protocol::Secp256k1,
            "2" => Protocol::Actor,
            "3" => Protocol::BLS,
            _ => return Err(Error::UnknownProtocol),
        };
        let raw = &addr[2..];

        if protocol == Protocol::ID {
            let id = raw.parse::<u64>().map_err(|_| Error::InvalidPayload)?;
            return Ok(Address::new_id(id));
        }

        let decoded = ADDRESS_ENCODER
            .decode(raw.as_bytes())
            .map_err(|e| Error::Base32Decoding(e.to_string()))?;
        if decoded.len() < CHECKSUM_HASH_LEN {
            return Err(Error::InvalidLength);
        }
        let (payload, cksm) = decoded.split_at(decoded.len() - CHECKSUM_HASH_LEN);

        let addr = Address::new(protocol, payload.to_vec())?;
        if !validate_checksum(&addr.to_bytes(), cksm) {
            return Err(Error::InvalidChecksum);
        }
        Ok(addr)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::Serialize::serialize(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bz: Vec<u8> = serde_bytes::Deserialize::deserialize(deserializer)?;
        Address::from_bytes(&bz).map_err(de::Error::custom)
    }
}

/// Checksum calculates the 4 byte checksum hash.
pub fn checksum(ingest: &[u8]) -> Vec<u8> {
    blake2b_variable(ingest, CHECKSUM_HASH_LEN)
}

/// Validates the checksum against the ingest data.
pub fn validate_checksum(ingest: &[u8], expect: &[u8]) -> bool {
    checksum(ingest) == expect
}

fn address_hash(ingest: &[u8]) -> Vec<u8> {
    blake2b_variable(ingest, PAYLOAD_HASH_LEN)
}

#[cfg(feature = "json")]
pub mod json {
    use super::*;
    use std::borrow::Cow;

    /// Wrapper for serializing and deserializing an Address from JSON.
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AddressJson(#[serde(with = "self")] pub Address);

    /// Wrapper for serializing an Address reference to JSON.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct AddressJsonRef<'a>(#[serde(with = "self")] pub &'a Address);

    impl From<AddressJson> for Address {
        fn from(wrapper: AddressJson) -> Self {
            wrapper.0
        }
    }

    pub fn serialize<S>(m: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&m.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr_str: Cow<'de, str> = Deserialize::deserialize(deserializer)?;
        Address::from_str(&addr_str).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let addr = Address::new_id(1024);
        assert_eq!(addr.id().unwrap(), 1024);
        assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);

        let s = addr.to_string();
        assert_eq!(Address::from_str(&s).unwrap(), addr);
    }

    #[test]
    fn secp_string_roundtrip() {
        let pubkey = [4u8; SECP_PUB_LEN];
        let addr = Address::new_secp256k1(&pubkey).unwrap();
        assert_eq!(addr.protocol(), Protocol::Secp256k1);
        assert_eq!(addr.payload().len(), PAYLOAD_HASH_LEN);

        let s = addr.to_string();
        assert_eq!(Address::from_str(&s).unwrap(), addr);
    }

    #[test]
    fn bls_payload_length_enforced() {
        assert!(matches!(
            Address::new_bls(&[1u8; 10]),
            Err(Error::InvalidBLSLength(10))
        ));
        let addr = Address::new_bls(&[1u8; BLS_PUB_LEN]).unwrap();
        assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let addr = Address::new_actor(&[1, 2, 3]).unwrap();
        let mut s = addr.to_string();
        // flip the trailing character of the checksum
        let last = if s.ends_with('a') { 'b' } else { 'a' };
        s.pop();
        s.push(last);
        assert!(Address::from_str(&s).is_err());
    }

    #[test]
    fn cbor_symmetric() {
        let addr = Address::new_id(55);
        let bz = serde_cbor::to_vec(&addr).unwrap();
        let back: Address = serde_cbor::from_slice(&bz).unwrap();
        assert_eq!(back, addr);
    }
}
