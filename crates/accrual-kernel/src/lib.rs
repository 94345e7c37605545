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

//! Primitive types shared by the reward-accrual engine: fixed-point decimals, multi-denomination
//! coin vectors, bech32 addresses, period and height counters, and the read-only views of the
//! staking registry the engine relies on.

pub mod address;
pub mod block_height;
pub mod coins;
pub mod decimal;
pub mod macros;
pub mod period;
pub mod staking;

pub use address::{AccountAddress, AddressError, ValidatorAddress, ADDRESS_LENGTH};
pub use block_height::BlockHeight;
pub use coins::{Coins, DecCoins, Denom};
pub use decimal::{Decimal, DecimalError};
pub use num::{BigInt, BigUint};
pub use period::Period;
pub use staking::{Delegation, Validator};

#[cfg(any(test, feature = "test-utils"))]
pub use address::tests::{any_account_address, any_validator_address};
#[cfg(any(test, feature = "test-utils"))]
pub use coins::tests::any_dec_coins;
#[cfg(any(test, feature = "test-utils"))]
pub use decimal::tests::{any_decimal, any_slash_fraction};

pub mod cbor {
    pub use minicbor::{data, decode, encode, Decode, Decoder, Encode, Encoder};

    use std::convert::Infallible;

    /// Encode any type implementing `Encode` into a fresh buffer, assuming no context.
    #[allow(clippy::expect_used)]
    pub fn to_cbor<T: Encode<()>>(value: &T) -> Vec<u8> {
        let mut buffer = Vec::new();
        let result: Result<(), encode::Error<Infallible>> = minicbor::encode(value, &mut buffer);
        result.expect("writing into a Vec cannot fail");
        buffer
    }

    /// Decode raw bytes into a structured type `T`, assuming no context.
    pub fn from_cbor<T: for<'d> Decode<'d, ()>>(bytes: &[u8]) -> Result<T, decode::Error> {
        minicbor::decode(bytes)
    }
}

pub use cbor::{from_cbor, to_cbor};
