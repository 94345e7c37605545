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
use num::{BigInt, Integer, One, Signed, Zero};
use std::{
    cmp::Ordering,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};
use thiserror::Error;

/// A signed fixed-point number with [`Decimal::PRECISION`] fractional digits, backed by an
/// arbitrary-precision integer. Every arithmetic operation is exact except multiplication and
/// division, which either truncate toward zero (`*_truncate` variants) or round half-to-even.
///
/// Reward ratios, stakes and reward vectors are all expressed with this type; truncating variants
/// are used wherever a result is about to be paid out so that it never exceeds what was accrued.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(BigInt);

const PRECISION_MULTIPLIER: u64 = 1_000_000_000_000_000_000;

const HALF_PRECISION_MULTIPLIER: u64 = PRECISION_MULTIPLIER / 2;

fn precision_multiplier() -> BigInt {
    BigInt::from(PRECISION_MULTIPLIER)
}

/// Remove the fractional digits introduced by a multiplication, rounding half-to-even.
fn chop_and_round(value: BigInt) -> BigInt {
    if value.is_negative() {
        return -chop_and_round(-value);
    }

    let (quotient, remainder) = value.div_rem(&precision_multiplier());
    if remainder.is_zero() {
        return quotient;
    }

    match remainder.cmp(&BigInt::from(HALF_PRECISION_MULTIPLIER)) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + BigInt::one(),
        Ordering::Equal if quotient.is_even() => quotient,
        Ordering::Equal => quotient + BigInt::one(),
    }
}

/// Remove the fractional digits introduced by a multiplication, truncating toward zero.
fn chop_and_truncate(value: BigInt) -> BigInt {
    value / precision_multiplier()
}

impl Decimal {
    pub const PRECISION: usize = 18;

    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(precision_multiplier())
    }

    /// Lift an integer amount into a decimal with no fractional part.
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self(value.into() * precision_multiplier())
    }

    /// Build a decimal from its raw representation, i.e. the value multiplied by 10^18.
    pub fn from_atomics(raw: impl Into<BigInt>) -> Self {
        Self(raw.into())
    }

    /// `numerator / denominator`, truncated. `None` when the denominator is zero.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }

        Some(Self(
            BigInt::from(numerator) * precision_multiplier() / BigInt::from(denominator),
        ))
    }

    pub fn atomics(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_integer(&self) -> bool {
        (&self.0 % precision_multiplier()).is_zero()
    }

    /// Multiplication truncating the result toward zero.
    pub fn mul_truncate(&self, rhs: &Decimal) -> Decimal {
        Self(chop_and_truncate(&self.0 * &rhs.0))
    }

    /// Multiplication by an integer, which is always exact.
    pub fn mul_int(&self, rhs: &BigInt) -> Decimal {
        Self(&self.0 * rhs)
    }

    /// Division rounding half-to-even. `None` on division by zero.
    pub fn quo(&self, rhs: &Decimal) -> Option<Decimal> {
        self.widened_quo(rhs).map(|quotient| Self(chop_and_round(quotient)))
    }

    /// Division truncating the result toward zero. `None` on division by zero.
    pub fn quo_truncate(&self, rhs: &Decimal) -> Option<Decimal> {
        self.widened_quo(rhs)
            .map(|quotient| Self(chop_and_truncate(quotient)))
    }

    // The dividend is scaled twice so that the quotient still carries 18 extra digits to be
    // chopped off afterwards.
    fn widened_quo(&self, rhs: &Decimal) -> Option<BigInt> {
        if rhs.is_zero() {
            return None;
        }

        Some(&self.0 * precision_multiplier() * precision_multiplier() / &rhs.0)
    }

    /// The integral part, truncated toward zero.
    pub fn truncate(&self) -> BigInt {
        chop_and_truncate(self.0.clone())
    }

    /// The value minus its integral part; carries the sign of the value.
    pub fn fract(&self) -> Decimal {
        Self(&self.0 % precision_multiplier())
    }

    pub fn abs(&self) -> Decimal {
        Self(self.0.abs())
    }
}

// ------------------------------------------------------------------ Arithmetic

impl Add<&Decimal> for &Decimal {
    type Output = Decimal;

    fn add(self, rhs: &Decimal) -> Decimal {
        Decimal(&self.0 + &rhs.0)
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl AddAssign<&Decimal> for Decimal {
    fn add_assign(&mut self, rhs: &Decimal) {
        self.0 += &rhs.0;
    }
}

impl Sub<&Decimal> for &Decimal {
    type Output = Decimal;

    fn sub(self, rhs: &Decimal) -> Decimal {
        Decimal(&self.0 - &rhs.0)
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl SubAssign<&Decimal> for Decimal {
    fn sub_assign(&mut self, rhs: &Decimal) {
        self.0 -= &rhs.0;
    }
}

/// Multiplication rounding half-to-even; see [`Decimal::mul_truncate`] for the truncating
/// variant.
impl Mul<&Decimal> for &Decimal {
    type Output = Decimal;

    fn mul(self, rhs: &Decimal) -> Decimal {
        Decimal(chop_and_round(&self.0 * &rhs.0))
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |total, value| &total + value)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |total, value| total + value)
    }
}

// ------------------------------------------------------------- Text conversion

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecimalError {
    #[error("invalid decimal {0:?}")]
    Invalid(String),
    #[error("decimal {0:?} has more than {max} fractional digits", max = Decimal::PRECISION)]
    TooPrecise(String),
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (integral, fractional) = self.0.abs().div_rem(&precision_multiplier());
        let sign = if self.0.is_negative() { "-" } else { "" };
        write!(
            f,
            "{sign}{integral}.{:0>width$}",
            fractional.to_string(),
            width = Self::PRECISION
        )
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecimalError::Invalid(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (integral, fractional) = match digits.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((integral, fractional)) => (integral, fractional),
            None => (digits, ""),
        };

        let is_numeric = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integral.is_empty() || !is_numeric(integral) || !is_numeric(fractional) {
            return Err(invalid());
        }

        if fractional.len() > Self::PRECISION {
            return Err(DecimalError::TooPrecise(s.to_string()));
        }

        let raw = format!("{integral}{fractional:0<width$}", width = Self::PRECISION);
        let value = BigInt::parse_bytes(raw.as_bytes(), 10).ok_or_else(invalid)?;

        Ok(Self(if negative { -value } else { value }))
    }
}

impl serde::Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Decimal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ------------------------------------------------------------------------ CBOR

impl<C> cbor::Encode<C> for Decimal {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.str(&self.to_string())?;
        Ok(())
    }
}

impl<'b, C> cbor::Decode<'b, C> for Decimal {
    fn decode(d: &mut cbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        d.str()?
            .parse()
            .map_err(|e: DecimalError| cbor::decode::Error::message(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        /// Non-negative decimals with a full fractional part, up to ten million units.
        pub fn any_decimal()(
            integral in 0..10_000_000u64,
            fractional in 0..PRECISION_MULTIPLIER,
        ) -> Decimal {
            Decimal::from_atomics(
                BigInt::from(integral) * precision_multiplier() + BigInt::from(fractional),
            )
        }
    }

    prop_compose! {
        /// Fractions in `[0, 1)`.
        pub fn any_slash_fraction()(raw in 0..PRECISION_MULTIPLIER) -> Decimal {
            Decimal::from_atomics(raw)
        }
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;
        use test_case::test_case;

        fn dec(s: &str) -> Decimal {
            s.parse().unwrap()
        }

        #[test_case("0" => "0.000000000000000000"; "zero")]
        #[test_case("10.7" => "10.700000000000000000"; "fractional")]
        #[test_case("-3.25" => "-3.250000000000000000"; "negative")]
        #[test_case("0.000000000000000001" => "0.000000000000000001"; "smallest unit")]
        fn display_canonical_form(input: &str) -> String {
            dec(input).to_string()
        }

        #[test_case("" ; "empty")]
        #[test_case("." ; "lone dot")]
        #[test_case("1." ; "trailing dot")]
        #[test_case(".5" ; "missing integral part")]
        #[test_case("1e5" ; "exponent")]
        #[test_case("--1" ; "double sign")]
        fn reject_malformed(input: &str) {
            assert_eq!(
                input.parse::<Decimal>(),
                Err(DecimalError::Invalid(input.to_string()))
            );
        }

        #[test]
        fn reject_excess_precision() {
            assert!(matches!(
                "0.0000000000000000001".parse::<Decimal>(),
                Err(DecimalError::TooPrecise(_))
            ));
        }

        #[test_case("1.5", "0.000000000000000001" => "0.000000000000000002"; "half to even up")]
        #[test_case("0.5", "0.000000000000000001" => "0.000000000000000000"; "half to even down")]
        #[test_case("2", "3.3" => "6.600000000000000000"; "exact")]
        fn mul_rounds_half_to_even(lhs: &str, rhs: &str) -> String {
            (&dec(lhs) * &dec(rhs)).to_string()
        }

        #[test]
        fn mul_truncate_never_rounds_up() {
            let lhs = dec("0.999999999999999999");
            let rhs = dec("0.999999999999999999");
            assert_eq!(lhs.mul_truncate(&rhs), dec("0.999999999999999998"));
            assert_eq!(&lhs * &rhs, dec("0.999999999999999998"));

            let third = dec("0.333333333333333333");
            assert_eq!(third.mul_truncate(&dec("0.5")), dec("0.166666666666666666"));
            assert_eq!(&third * &dec("0.5"), dec("0.166666666666666666"));

            let two_thirds = dec("0.666666666666666667");
            assert_eq!(two_thirds.mul_truncate(&dec("0.5")), dec("0.333333333333333333"));
            assert_eq!(&two_thirds * &dec("0.5"), dec("0.333333333333333334"));
        }

        #[test]
        fn quo_by_zero_is_undefined() {
            assert_eq!(Decimal::one().quo(&Decimal::zero()), None);
            assert_eq!(Decimal::one().quo_truncate(&Decimal::zero()), None);
        }

        #[test]
        fn quo_truncate_and_round() {
            let two = Decimal::from_integer(2);
            let three = Decimal::from_integer(3);
            assert_eq!(two.quo_truncate(&three), Some(dec("0.666666666666666666")));
            assert_eq!(two.quo(&three), Some(dec("0.666666666666666667")));
        }

        #[test]
        fn truncate_and_fract_split_the_value() {
            let value = dec("10.7");
            assert_eq!(value.truncate(), BigInt::from(10));
            assert_eq!(value.fract(), dec("0.7"));
            assert_eq!(Decimal::from_integer(value.truncate()) + value.fract(), value);
        }

        #[test]
        fn from_ratio() {
            assert_eq!(Decimal::from_ratio(1, 2), Some(dec("0.5")));
            assert_eq!(Decimal::from_ratio(1, 3), Some(dec("0.333333333333333333")));
            assert_eq!(Decimal::from_ratio(1, 0), None);
        }

        proptest! {
            #[test]
            fn prop_display_parse_roundtrip(value in any_decimal()) {
                prop_assert_eq!(value.to_string().parse::<Decimal>(), Ok(value));
            }

            #[test]
            fn prop_mul_truncate_below_mul(lhs in any_decimal(), rhs in any_decimal()) {
                prop_assert!(lhs.mul_truncate(&rhs) <= &lhs * &rhs);
            }

            #[test]
            fn prop_slash_fraction_is_below_one(fraction in any_slash_fraction()) {
                prop_assert!(fraction < Decimal::one());
                prop_assert!(!fraction.is_negative());
            }
        }

        prop_cbor_roundtrip!(Decimal, any_decimal());
    }
}
