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
use std::{fmt, ops::Add};

/// A per-validator counter delimiting cumulative reward-ratio snapshots. Period `0` is the
/// validator's genesis snapshot; the live accumulator always sits one period ahead of the most
/// recently closed snapshot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(transparent)]
pub struct Period(u64);

impl Period {
    pub const GENESIS: Period = Period(0);

    pub const fn new(period: u64) -> Self {
        Self(period)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The period closed right before this one. The genesis period has no predecessor and is
    /// returned as-is.
    pub fn previous(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for Period {
    fn from(period: u64) -> Self {
        Self(period)
    }
}

impl From<Period> for u64 {
    fn from(period: Period) -> u64 {
        period.0
    }
}

impl Add<u64> for Period {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<C> cbor::Encode<C> for Period {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.u64(self.0)?;
        Ok(())
    }
}

impl<'b, C> cbor::Decode<'b, C> for Period {
    fn decode(d: &mut cbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        d.u64().map(Period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_no_predecessor() {
        assert_eq!(Period::GENESIS.previous(), Period::GENESIS);
        assert_eq!(Period::new(7).previous(), Period::new(6));
        assert_eq!(Period::new(7).next(), Period::new(8));
    }

    #[test]
    fn big_endian_bytes_preserve_order() {
        let lower = Period::new(255).to_be_bytes();
        let upper = Period::new(256).to_be_bytes();
        assert!(lower < upper);
    }
}
