// Copyright 2025 Accrual Maintainers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::cbor;
use bech32::{Bech32, Hrp};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const ADDRESS_LENGTH: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed bech32 address: {0}")]
    Malformed(String),
    #[error("unexpected human-readable part {found:?}, expected {expected:?}")]
    UnexpectedPrefix { found: String, expected: &'static str },
    #[error("unexpected address length {0}, expected {ADDRESS_LENGTH}")]
    UnexpectedLength(usize),
}

/// Define a fixed-length address newtype displayed as bech32 with the given human-readable part.
macro_rules! bech32_address {
    ($(#[$meta:meta])* $name:ident, $hrp:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; ADDRESS_LENGTH]);

        impl $name {
            pub const HRP: &'static str = $hrp;

            pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
                &self.0
            }
        }

        impl From<[u8; ADDRESS_LENGTH]> for $name {
            fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = AddressError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                <[u8; ADDRESS_LENGTH]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| AddressError::UnexpectedLength(bytes.len()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                bech32::encode_to_fmt::<Bech32, _>(f, Hrp::parse_unchecked(Self::HRP), &self.0)
                    .map_err(|_| fmt::Error)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (hrp, bytes) =
                    bech32::decode(s).map_err(|e| AddressError::Malformed(e.to_string()))?;

                if hrp != Hrp::parse_unchecked(Self::HRP) {
                    return Err(AddressError::UnexpectedPrefix {
                        found: hrp.to_string(),
                        expected: Self::HRP,
                    });
                }

                Self::try_from(bytes.as_slice())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<C> cbor::Encode<C> for $name {
            fn encode<W: cbor::encode::Write>(
                &self,
                e: &mut cbor::Encoder<W>,
                _ctx: &mut C,
            ) -> Result<(), cbor::encode::Error<W::Error>> {
                e.bytes(&self.0)?;
                Ok(())
            }
        }

        impl<'b, C> cbor::Decode<'b, C> for $name {
            fn decode(
                d: &mut cbor::Decoder<'b>,
                _ctx: &mut C,
            ) -> Result<Self, cbor::decode::Error> {
                Self::try_from(d.bytes()?)
                    .map_err(|e| cbor::decode::Error::message(e.to_string()))
            }
        }
    };
}

bech32_address!(
    /// An account able to hold balances and own delegations.
    AccountAddress,
    "acc"
);

bech32_address!(
    /// The operator address identifying a validator.
    ValidatorAddress,
    "valoper"
);

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        pub fn any_account_address()(bytes in any::<[u8; ADDRESS_LENGTH]>()) -> AccountAddress {
            AccountAddress::new(bytes)
        }
    }

    prop_compose! {
        pub fn any_validator_address()(bytes in any::<[u8; ADDRESS_LENGTH]>()) -> ValidatorAddress {
            ValidatorAddress::new(bytes)
        }
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;

        proptest! {
            #[test]
            fn prop_bech32_roundtrip(address in any_account_address()) {
                prop_assert_eq!(address.to_string().parse::<AccountAddress>(), Ok(address));
            }
        }

        #[test]
        fn reject_foreign_prefix() {
            let validator = ValidatorAddress::new([7; ADDRESS_LENGTH]);
            assert!(validator.to_string().starts_with("valoper1"));
            assert_eq!(
                validator.to_string().parse::<AccountAddress>(),
                Err(AddressError::UnexpectedPrefix {
                    found: "valoper".to_string(),
                    expected: "acc"
                })
            );
        }

        prop_cbor_roundtrip!(AccountAddress, any_account_address());
    }
}
