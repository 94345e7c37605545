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


use super::Args;
use accrual_kernel::{
    AccountAddress, BlockHeight, DecCoins, Decimal, ValidatorAddress, ADDRESS_LENGTH,
};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

const DENOMS: [&str; 2] = ["uatom", "ustake"];

/// Probability for a block to move a delegation from one validator to another.
const REDELEGATE_PROBABILITY: f64 = 0.05;

/// Probability for a block to bond new tokens.
const DELEGATE_PROBABILITY: f64 = 0.5;

/// Slash fractions are drawn in hundredths, up to this many.
const MAX_SLASH_HUNDREDTHS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Allocate {
        validator: ValidatorAddress,
        rewards: DecCoins,
    },
    Delegate {
        delegator: AccountAddress,
        validator: ValidatorAddress,
        amount: u64,
    },
    Redelegate {
        delegator: AccountAddress,
        source: ValidatorAddress,
        destination: ValidatorAddress,
    },
    Slash {
        validator: ValidatorAddress,
        fraction: Decimal,
    },
    Withdraw {
        delegator: AccountAddress,
        validator: ValidatorAddress,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub height: BlockHeight,
    pub actions: Vec<Action>,
}

fn address_bytes(tag: u8, index: u16) -> [u8; ADDRESS_LENGTH] {
    let mut bytes = [tag; ADDRESS_LENGTH];
    bytes[ADDRESS_LENGTH - 2..].copy_from_slice(&index.to_be_bytes());
    bytes
}

pub fn validator_addresses(count: u16) -> Vec<ValidatorAddress> {
    (0..count)
        .map(|index| ValidatorAddress::new(address_bytes(0x56, index)))
        .collect()
}

pub fn delegator_addresses(count: u16) -> Vec<AccountAddress> {
    (0..count)
        .map(|index| AccountAddress::new(address_bytes(0xde, index)))
        .collect()
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len()))
}

/// Generate blocks at heights `1..=number_of_blocks`. Every block allocates fractional rewards to
/// one validator; other actions are drawn with their respective probabilities and shuffled.
pub fn generate_blocks(
    rng: &mut impl Rng,
    args: &Args,
    validators: &[ValidatorAddress],
    delegators: &[AccountAddress],
) -> Vec<Block> {
    (1..=args.number_of_blocks)
        .map(|height| Block {
            height: BlockHeight::new(height),
            actions: generate_actions(rng, args, validators, delegators),
        })
        .collect()
}

fn generate_actions(
    rng: &mut impl Rng,
    args: &Args,
    validators: &[ValidatorAddress],
    delegators: &[AccountAddress],
) -> Vec<Action> {
    let mut actions = Vec::new();

    let (Some(validator), Some(delegator)) = (pick(rng, validators), pick(rng, delegators)) else {
        return actions;
    };

    let denom = DENOMS[rng.random_range(0..DENOMS.len())];
    if let Some(amount) = Decimal::from_ratio(rng.random_range(1..=100_000), 100) {
        actions.push(Action::Allocate {
            validator: *validator,
            rewards: DecCoins::from_coin(denom, amount),
        });
    }

    if rng.random_bool(DELEGATE_PROBABILITY) {
        actions.push(Action::Delegate {
            delegator: *delegator,
            validator: *validator,
            amount: rng.random_range(1..=1_000),
        });
    }

    if rng.random_bool(args.withdraw_probability) {
        if let (Some(delegator), Some(validator)) = (pick(rng, delegators), pick(rng, validators)) {
            actions.push(Action::Withdraw {
                delegator: *delegator,
                validator: *validator,
            });
        }
    }

    if rng.random_bool(args.slash_probability) {
        if let Some(fraction) =
            Decimal::from_ratio(rng.random_range(1..=MAX_SLASH_HUNDREDTHS), 100)
        {
            actions.push(Action::Slash {
                validator: *validator,
                fraction,
            });
        }
    }

    if validators.len() > 1 && rng.random_bool(REDELEGATE_PROBABILITY) {
        if let (Some(source), Some(destination)) = (pick(rng, validators), pick(rng, validators)) {
            if source != destination {
                actions.push(Action::Redelegate {
                    delegator: *delegator,
                    source: *source,
                    destination: *destination,
                });
            }
        }
    }

    actions.shuffle(rng);
    actions
}
