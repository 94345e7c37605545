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

//! Read-only views over the staking registry. The accrual engine never mutates validators nor
//! delegations; it only observes them when closing periods and computing stakes.

use crate::{AccountAddress, BigInt, BigUint, Decimal, ValidatorAddress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub operator: ValidatorAddress,
    /// Tokens currently bonded to the validator, across all delegators.
    pub tokens: BigUint,
    /// Total shares issued to delegators; shares convert to tokens at `tokens / delegator_shares`.
    pub delegator_shares: Decimal,
}

impl Validator {
    pub fn new(operator: ValidatorAddress, tokens: BigUint, delegator_shares: Decimal) -> Self {
        Self {
            operator,
            tokens,
            delegator_shares,
        }
    }

    pub fn tokens_dec(&self) -> Decimal {
        Decimal::from_integer(BigInt::from(self.tokens.clone()))
    }

    /// Tokens backing the given amount of shares, rounded. Zero when no shares are issued.
    pub fn share_tokens(&self, shares: &Decimal) -> Decimal {
        shares
            .mul_int(&BigInt::from(self.tokens.clone()))
            .quo(&self.delegator_shares)
            .unwrap_or_else(Decimal::zero)
    }

    /// Tokens backing the given amount of shares, truncated toward zero.
    pub fn share_tokens_truncated(&self, shares: &Decimal) -> Decimal {
        shares
            .mul_int(&BigInt::from(self.tokens.clone()))
            .quo_truncate(&self.delegator_shares)
            .unwrap_or_else(Decimal::zero)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub delegator: AccountAddress,
    pub validator: ValidatorAddress,
    pub shares: Decimal,
}

impl Delegation {
    pub fn new(delegator: AccountAddress, validator: ValidatorAddress, shares: Decimal) -> Self {
        Self {
            delegator,
            validator,
            shares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn validator(tokens: u64, shares: &str) -> Validator {
        Validator::new(
            ValidatorAddress::new([1; 20]),
            BigUint::from(tokens),
            dec(shares),
        )
    }

    #[test]
    fn share_tokens_at_par() {
        let v = validator(1000, "1000");
        assert_eq!(v.share_tokens(&dec("250")), dec("250"));
        assert_eq!(v.share_tokens_truncated(&dec("250")), dec("250"));
    }

    #[test]
    fn share_tokens_after_slash() {
        let v = validator(900, "1000");
        assert_eq!(v.share_tokens(&dec("100")), dec("90"));
    }

    #[test]
    fn share_tokens_rounding() {
        let v = validator(2, "3");
        assert_eq!(v.share_tokens(&dec("1")), dec("0.666666666666666667"));
        assert_eq!(
            v.share_tokens_truncated(&dec("1")),
            dec("0.666666666666666666")
        );
    }

    #[test]
    fn share_tokens_without_shares() {
        let v = validator(0, "0");
        assert_eq!(v.share_tokens(&dec("1")), Decimal::zero());
        assert_eq!(v.share_tokens_truncated(&dec("1")), Decimal::zero());
    }
}
