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

use crate::{cbor, Decimal};
use num::{BigInt, BigUint, Zero};
use serde::ser::SerializeMap;
use std::{collections::BTreeMap, fmt, ops::AddAssign};

pub type Denom = String;

// -------------------------------------------------------------------- DecCoins

/// A vector of decimal amounts indexed by denomination. Zero amounts are never stored, so two
/// vectors holding the same non-zero amounts always compare equal.
///
/// Amounts may be negative as the result of [`DecCoins::sub`]; callers are expected to check for
/// it with [`DecCoins::is_any_negative`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecCoins(BTreeMap<Denom, Decimal>);

impl DecCoins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_coin(denom: impl Into<Denom>, amount: Decimal) -> Self {
        Self::from_iter([(denom.into(), amount)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn amount_of(&self, denom: &str) -> Decimal {
        self.0.get(denom).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Denom, &Decimal)> {
        self.0.iter()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &Denom> {
        self.0.keys()
    }

    fn accumulate(&mut self, denom: &str, amount: &Decimal) {
        let total = &self.amount_of(denom) + amount;
        self.set(denom.to_string(), total);
    }

    fn set(&mut self, denom: Denom, amount: Decimal) {
        if amount.is_zero() {
            self.0.remove(&denom);
        } else {
            self.0.insert(denom, amount);
        }
    }

    pub fn add(&self, rhs: &DecCoins) -> DecCoins {
        let mut total = self.clone();
        total += rhs;
        total
    }

    /// Per-denomination difference. The result may hold negative amounts.
    pub fn sub(&self, rhs: &DecCoins) -> DecCoins {
        let mut difference = self.clone();
        for (denom, amount) in rhs.iter() {
            difference.accumulate(denom, &-amount.clone());
        }
        difference
    }

    /// Per-denomination difference; `None` if any resulting amount would be negative.
    pub fn checked_sub(&self, rhs: &DecCoins) -> Option<DecCoins> {
        let difference = self.sub(rhs);
        (!difference.is_any_negative()).then_some(difference)
    }

    pub fn is_any_negative(&self) -> bool {
        self.0.values().any(Decimal::is_negative)
    }

    /// Multiply every amount by a decimal, truncating each product.
    pub fn mul_dec_truncate(&self, rhs: &Decimal) -> DecCoins {
        self.iter()
            .map(|(denom, amount)| (denom.clone(), amount.mul_truncate(rhs)))
            .collect()
    }

    /// Divide every amount by a decimal, truncating each quotient. `None` when dividing by zero.
    pub fn quo_dec_truncate(&self, rhs: &Decimal) -> Option<DecCoins> {
        self.iter()
            .map(|(denom, amount)| Some((denom.clone(), amount.quo_truncate(rhs)?)))
            .collect()
    }

    /// Per-denomination minimum of `self` and `rhs`; denominations absent from `rhs` count as
    /// zero and therefore disappear.
    pub fn intersect(&self, rhs: &DecCoins) -> DecCoins {
        self.iter()
            .map(|(denom, amount)| {
                let bound = rhs.amount_of(denom);
                (denom.clone(), amount.clone().min(bound))
            })
            .collect()
    }

    /// Split every amount into its integral part and the fractional change. Negative amounts have
    /// no integral payout and are left entirely in the change.
    pub fn truncate_decimal(&self) -> (Coins, DecCoins) {
        let mut truncated = Coins::new();
        let mut change = DecCoins::new();

        for (denom, amount) in self.iter() {
            match amount.truncate().to_biguint() {
                Some(integral) if !amount.is_negative() => {
                    change.set(denom.clone(), amount.fract());
                    truncated.set(denom.clone(), integral);
                }
                _ => change.set(denom.clone(), amount.clone()),
            }
        }

        (truncated, change)
    }
}

impl<D: Into<Denom>> FromIterator<(D, Decimal)> for DecCoins {
    fn from_iter<I: IntoIterator<Item = (D, Decimal)>>(iter: I) -> Self {
        let mut coins = DecCoins::new();
        for (denom, amount) in iter {
            coins.accumulate(&denom.into(), &amount);
        }
        coins
    }
}

impl AddAssign<&DecCoins> for DecCoins {
    fn add_assign(&mut self, rhs: &DecCoins) {
        for (denom, amount) in rhs.iter() {
            self.accumulate(denom, amount);
        }
    }
}

impl fmt::Display for DecCoins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

impl serde::Serialize for DecCoins {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (denom, amount) in self.iter() {
            map.serialize_entry(denom, amount)?;
        }
        map.end()
    }
}

impl<C> cbor::Encode<C> for DecCoins {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.map(self.len() as u64)?;
        for (denom, amount) in self.iter() {
            e.str(denom)?;
            e.encode_with(amount, ctx)?;
        }
        Ok(())
    }
}

impl<'b, C> cbor::Decode<'b, C> for DecCoins {
    fn decode(d: &mut cbor::Decoder<'b>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let len = d
            .map()?
            .ok_or_else(|| cbor::decode::Error::message("expected definite-length coins map"))?;

        let mut coins = DecCoins::new();
        for _ in 0..len {
            let denom = d.str()?.to_string();
            let amount: Decimal = d.decode_with(ctx)?;
            coins.accumulate(&denom, &amount);
        }

        Ok(coins)
    }
}

// ----------------------------------------------------------------------- Coins

/// A vector of integral, non-negative amounts indexed by denomination; what actually gets
/// credited to accounts. Zero amounts are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coins(BTreeMap<Denom, BigUint>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn amount_of(&self, denom: &str) -> BigUint {
        self.0.get(denom).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Denom, &BigUint)> {
        self.0.iter()
    }

    fn set(&mut self, denom: Denom, amount: BigUint) {
        if amount.is_zero() {
            self.0.remove(&denom);
        } else {
            self.0.insert(denom, amount);
        }
    }

    pub fn add(&self, rhs: &Coins) -> Coins {
        let mut total = self.clone();
        total += rhs;
        total
    }

    pub fn to_dec_coins(&self) -> DecCoins {
        self.iter()
            .map(|(denom, amount)| {
                (
                    denom.clone(),
                    Decimal::from_integer(BigInt::from(amount.clone())),
                )
            })
            .collect()
    }
}

impl<D: Into<Denom>, A: Into<BigUint>> FromIterator<(D, A)> for Coins {
    fn from_iter<I: IntoIterator<Item = (D, A)>>(iter: I) -> Self {
        let mut coins = Coins::new();
        for (denom, amount) in iter {
            let denom = denom.into();
            let total = coins.amount_of(&denom) + amount.into();
            coins.set(denom, total);
        }
        coins
    }
}

impl AddAssign<&Coins> for Coins {
    fn add_assign(&mut self, rhs: &Coins) {
        for (denom, amount) in rhs.iter() {
            let total = self.amount_of(denom) + amount;
            self.set(denom.clone(), total);
        }
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

impl serde::Serialize for Coins {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (denom, amount) in self.iter() {
            map.serialize_entry(denom, &amount.to_string())?;
        }
        map.end()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use crate::any_decimal;
    use proptest::{collection, prelude::*};

    pub fn any_dec_coins() -> impl Strategy<Value = DecCoins> {
        let denom = prop::sample::select(vec!["uatom", "uosmo", "stake"]);
        collection::vec((denom, any_decimal()), 0..3).prop_map(DecCoins::from_iter)
    }

}
