// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

/// Protocol defines the addressing protocol used to derive data to an address.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Protocol {
    /// ID protocol addressing, assigned by the init actor.
    ID = 0,
    /// SECP256K1 key addressing, a hash of the public key.
    Secp256k1 = 1,
    /// Actor protocol addressing, a hash of deployment data.
    Actor = 2,
    /// BLS key addressing, the full public key.
    BLS = 3,
}

impl Protocol {
    /// Returns protocol for a byte, if it exists.
    pub(crate) fn from_byte(b: u8) -> Option<Protocol> {
        match b {
            0 => Some(Protocol::ID),
            1 => Some(Protocol::Secp256k1),
            2 => Some(Protocol::Actor),
            3 => Some(Protocol::BLS),
            _ => None,
        }
    }
}

/// Protocol format in an address string is its single digit discriminant.
impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
