// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Exit code of a message execution, normalized to the closed set below.
/// Codes the VM reports outside this set fail decoding instead of being
/// carried opaquely.
#[derive(PartialEq, Eq, Debug, Clone, Copy, FromPrimitive, Hash)]
#[repr(u64)]
pub enum ExitCode {
    Ok = 0,

    /// Indicates the message sender doesn't exist.
    SysErrSenderInvalid = 1,
    /// Indicates the message sender was not in a valid state to send this message.
    SysErrSenderStateInvalid = 2,
    /// Indicates failure to find a method in an actor.
    SysErrInvalidMethod = 3,
    /// Indicates the receiver of a message is not valid.
    SysErrInvalidReceiver = 5,
    /// Indicates the message sender didn't have the funds to cover the message.
    SysErrInsufficientFunds = 6,
    /// Indicates the message ran out of gas.
    SysErrOutOfGas = 7,
    /// Indicates the message receiver aborted the method.
    SysErrForbidden = 8,
    /// Indicates actor code performed a disallowed operation.
    SysErrIllegalActor = 9,
    /// Indicates an invalid argument passed to a runtime method.
    SysErrIllegalArgument = 10,

    /// Indicates a method parameter is invalid.
    ErrIllegalArgument = 16,
    /// Indicates a requested resource does not exist.
    ErrNotFound = 17,
    /// Indicates an action is disallowed.
    ErrForbidden = 18,
    /// Indicates a balance of funds is insufficient.
    ErrInsufficientFunds = 19,
    /// Indicates an actor's internal state is invalid.
    ErrIllegalState = 20,
    /// Indicates de/serialization failure within actor code.
    ErrSerialization = 21,
}

impl ExitCode {
    /// Returns true if the exit code was a success.
    pub fn is_success(self) -> bool {
        self == ExitCode::Ok
    }

    /// Returns true if the execution was aborted by the system rather than
    /// the called actor.
    pub fn is_sys_error(self) -> bool {
        (self as u64) < 16 && self != ExitCode::Ok
    }

    /// Converts a raw code to the normalized enum, if it is in range.
    pub fn from_u64(v: u64) -> Option<Self> {
        FromPrimitive::from_u64(v)
    }
}

impl Serialize for ExitCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (*self as u64).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExitCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v: u64 = Deserialize::deserialize(deserializer)?;
        ExitCode::from_u64(v).ok_or_else(|| de::Error::custom(format!("unknown exit code {}", v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_codes() {
        assert!(ExitCode::Ok.is_success());
        assert!(ExitCode::SysErrOutOfGas.is_sys_error());
        assert!(!ExitCode::ErrNotFound.is_sys_error());
        assert_eq!(ExitCode::from_u64(21), Some(ExitCode::ErrSerialization));
        assert_eq!(ExitCode::from_u64(4), None);
    }
}
