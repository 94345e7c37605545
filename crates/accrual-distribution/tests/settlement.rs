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


use accrual_distribution::{
    allocate_to_validator, calculate_rewards_between, export_all_rewards_for_delegator, historical,
    hooks, initialize_delegation, invariants, query,
    store::{
        atomically,
        columns::{fee_pool, outstanding_rewards, starting_info},
        in_memory::MemoryStore,
        ReadStore, StoreError,
    },
    testing::{MemoryBank, MemoryStaking},
    withdraw_delegation_rewards, BankError, DistributionError, Fatal, StakingRegistry,
};
use accrual_kernel::{
    AccountAddress, BlockHeight, Coins, DecCoins, Decimal, Period, ValidatorAddress,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const VALIDATOR: ValidatorAddress = ValidatorAddress::new([0x11; 20]);
const OTHER_VALIDATOR: ValidatorAddress = ValidatorAddress::new([0x22; 20]);
const ALICE: AccountAddress = AccountAddress::new([0xa; 20]);
const BOB: AccountAddress = AccountAddress::new([0xb; 20]);
const CAROL: AccountAddress = AccountAddress::new([0xc; 20]);

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn uatom(s: &str) -> DecCoins {
    DecCoins::from_coin("uatom", dec(s))
}

fn coins(amount: u64) -> Coins {
    Coins::from_iter([("uatom", amount)])
}

/// A chain driving the engine the way a staking module would, one transaction per hook.
#[derive(Default)]
struct Chain {
    store: MemoryStore,
    staking: MemoryStaking,
    bank: MemoryBank,
    allocated: DecCoins,
}

impl Chain {
    fn with_validators(validators: &[ValidatorAddress]) -> Self {
        let mut chain = Self::default();
        for validator in validators {
            chain.staking.create_validator(*validator);
            atomically(&chain.store, |db| hooks::after_validator_created(db, validator)).unwrap();
        }
        chain
    }

    fn delegate(
        &mut self,
        delegator: AccountAddress,
        validator: ValidatorAddress,
        amount: u64,
        height: u64,
    ) -> Coins {
        let height = BlockHeight::new(height);
        let existing = self.staking.delegation(&delegator, &validator).is_some();

        let payout = atomically(&self.store, |db| -> Result<Coins, DistributionError> {
            if existing {
                hooks::before_delegation_shares_modified(
                    db,
                    &self.staking,
                    &self.bank,
                    &validator,
                    &delegator,
                    height,
                )
            } else {
                hooks::before_delegation_created(db, &self.staking, &validator)?;
                Ok(Coins::new())
            }
        })
        .unwrap();

        self.staking.delegate(delegator, validator, amount).unwrap();

        atomically(&self.store, |db| {
            hooks::after_delegation_modified(db, &self.staking, &validator, &delegator, height)
        })
        .unwrap();

        payout
    }

    fn allocate(&mut self, validator: ValidatorAddress, amount: &str) {
        let rewards = uatom(amount);
        atomically(&self.store, |db| allocate_to_validator(db, &validator, &rewards)).unwrap();
        self.allocated += &rewards;
    }

    fn slash(&mut self, validator: ValidatorAddress, fraction: &str, height: u64) {
        let fraction = dec(fraction);
        atomically(&self.store, |db| {
            hooks::before_validator_slashed(
                db,
                &self.staking,
                &validator,
                BlockHeight::new(height),
                &fraction,
            )
        })
        .unwrap();
        self.staking.slash(&validator, &fraction).unwrap();
    }

    fn withdraw(
        &self,
        validator: ValidatorAddress,
        delegator: AccountAddress,
        height: u64,
    ) -> Result<Coins, DistributionError> {
        let height = BlockHeight::new(height);
        atomically(&self.store, |db| -> Result<Coins, DistributionError> {
            let payout = withdraw_delegation_rewards(
                db,
                &self.staking,
                &self.bank,
                &validator,
                &delegator,
                height,
            )?;
            initialize_delegation(db, &self.staking, &validator, &delegator, height)?;
            Ok(payout)
        })
    }

    fn rewards(
        &self,
        validator: ValidatorAddress,
        delegator: AccountAddress,
        height: u64,
    ) -> DecCoins {
        query::delegation_rewards(
            &self.store,
            &self.staking,
            &validator,
            &delegator,
            BlockHeight::new(height),
        )
        .unwrap()
    }

    fn community_pool(&self) -> DecCoins {
        fee_pool::get(&self.store).unwrap().community_pool
    }

    fn outstanding(&self, validator: ValidatorAddress) -> DecCoins {
        outstanding_rewards::get(&self.store, &validator)
            .unwrap()
            .unwrap_or_default()
            .rewards
    }

    fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.store.iter_range(Vec::new(), None).unwrap().collect()
    }

    fn assert_consistent(&self) {
        invariants::check_all(&self.store).unwrap();

        let outstanding = outstanding_rewards::iter(&self.store)
            .unwrap()
            .map(|entry| entry.map(|(_, row)| row.rewards))
            .collect::<Result<Vec<_>, StoreError>>()
            .unwrap()
            .iter()
            .fold(DecCoins::new(), |total, rewards| total.add(rewards));

        assert_eq!(
            self.allocated,
            outstanding
                .add(&self.community_pool())
                .add(&self.bank.total().to_dec_coins())
        );
    }
}

#[test]
fn slash_splits_the_accrual_window() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 1000, 1);
    chain.allocate(VALIDATOR, "1000");
    chain.slash(VALIDATOR, "0.5", 3);
    chain.allocate(VALIDATOR, "500");

    // 1000 * (1 - 0) + 500 * (2 - 1)
    assert_eq!(chain.rewards(VALIDATOR, ALICE, 5), uatom("1500"));

    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 5).unwrap(), coins(1500));
    assert_eq!(chain.bank.balance(&ALICE), coins(1500));
    assert!(chain.outstanding(VALIDATOR).is_empty());
    chain.assert_consistent();
}

#[test]
fn remainder_goes_to_the_community_pool() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 1, 1);
    chain.allocate(VALIDATOR, "10.7");
    assert_eq!(chain.outstanding(VALIDATOR), uatom("10.7"));

    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 2).unwrap(), coins(10));

    assert_eq!(chain.bank.balance(&ALICE), coins(10));
    assert_eq!(chain.community_pool(), uatom("0.7"));
    assert!(chain.outstanding(VALIDATOR).is_empty());
    chain.assert_consistent();
}

#[test]
fn nothing_accrues_within_the_starting_block() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 100, 7);
    chain.allocate(VALIDATOR, "50");

    assert!(chain.rewards(VALIDATOR, ALICE, 7).is_empty());
    assert_eq!(chain.rewards(VALIDATOR, ALICE, 8), uatom("50"));
}

#[test]
fn withdraw_within_the_starting_block_pays_nothing() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 100, 7);
    chain.allocate(VALIDATOR, "50");

    assert!(chain.withdraw(VALIDATOR, ALICE, 7).unwrap().is_empty());
    assert!(chain.bank.total().is_empty());
    assert!(chain.community_pool().is_empty());
    assert_eq!(chain.outstanding(VALIDATOR), uatom("50"));
    chain.assert_consistent();
}

#[test]
fn withdraw_releases_the_previous_anchor() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 10, 1);
    chain.allocate(VALIDATOR, "5");

    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 2).unwrap(), coins(5));
    assert!(matches!(
        historical::get(&chain.store, &VALIDATOR, Period::new(1)),
        Err(Fatal::MissingHistoricalRewards { .. })
    ));
    assert_eq!(
        historical::get(&chain.store, &VALIDATOR, Period::new(2))
            .unwrap()
            .reference_count,
        1
    );
    chain.assert_consistent();
}

#[test]
fn stake_above_the_live_delegation_is_fatal() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 10, 1);
    chain.allocate(VALIDATOR, "5");
    // Slashed in staking only, the engine never hears about it.
    chain.staking.slash(&VALIDATOR, &dec("0.5")).unwrap();

    let before = chain.snapshot();
    let error = chain.withdraw(VALIDATOR, ALICE, 2).unwrap_err();

    assert!(error.is_fatal());
    assert!(matches!(
        error,
        DistributionError::Fatal(Fatal::StakeExceedsCurrent { .. })
    ));
    assert_eq!(chain.snapshot(), before);
    assert!(chain.bank.total().is_empty());
}

#[test]
fn withdrawn_rewards_are_not_claimable_twice() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 4, 1);
    chain.allocate(VALIDATOR, "12");

    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 2).unwrap(), coins(12));
    assert!(chain.rewards(VALIDATOR, ALICE, 2).is_empty());
    assert!(chain.rewards(VALIDATOR, ALICE, 3).is_empty());
    assert!(chain.withdraw(VALIDATOR, ALICE, 3).unwrap().is_empty());
    assert_eq!(chain.bank.balance(&ALICE), coins(12));
}

#[test]
fn rewards_are_shared_across_delegators_and_slashes() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 300, 1);
    chain.delegate(BOB, VALIDATOR, 100, 2);
    chain.allocate(VALIDATOR, "100");
    chain.slash(VALIDATOR, "0.1", 4);
    chain.allocate(VALIDATOR, "90");

    // 300 * 0.25 + 270 * 0.25
    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 6).unwrap(), coins(142));
    // 100 * 0.25 + 90 * 0.25, settled before the delegation grows
    assert_eq!(chain.delegate(BOB, VALIDATOR, 50, 7), coins(47));

    assert_eq!(chain.community_pool(), uatom("1"));
    assert!(chain.outstanding(VALIDATOR).is_empty());
    chain.assert_consistent();

    chain.allocate(VALIDATOR, "41");
    chain.withdraw(VALIDATOR, ALICE, 9).unwrap();
    chain.withdraw(VALIDATOR, BOB, 9).unwrap();
    chain.assert_consistent();
}

#[test]
fn reference_counts_follow_anchors_and_slashes() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 1000, 1);
    chain.allocate(VALIDATOR, "1000");
    chain.slash(VALIDATOR, "0.5", 3);
    chain.allocate(VALIDATOR, "500");
    chain.withdraw(VALIDATOR, ALICE, 5).unwrap();

    // Period 1 lost its only anchor, period 2 is held by the slash, period 3 by the new anchor.
    assert!(matches!(
        historical::get(&chain.store, &VALIDATOR, Period::new(1)),
        Err(Fatal::MissingHistoricalRewards { .. })
    ));
    assert_eq!(
        historical::get(&chain.store, &VALIDATOR, Period::new(2))
            .unwrap()
            .reference_count,
        1
    );
    assert_eq!(
        historical::get(&chain.store, &VALIDATOR, Period::new(3))
            .unwrap()
            .reference_count,
        1
    );
    assert_eq!(
        starting_info::get(&chain.store, &VALIDATOR, &ALICE)
            .unwrap()
            .map(|info| info.previous_period),
        Some(Period::new(3))
    );
    chain.assert_consistent();
}

#[test]
fn inverted_period_range_is_fatal() {
    let chain = Chain::with_validators(&[VALIDATOR]);

    let result = calculate_rewards_between(
        &chain.store,
        &VALIDATOR,
        Period::new(5),
        Period::new(3),
        &dec("1"),
    );

    assert!(matches!(
        result,
        Err(Fatal::InvalidPeriodRange { starting, ending })
            if starting == Period::new(5) && ending == Period::new(3)
    ));
}

#[test]
fn withdraw_to_a_registered_address() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 10, 1);
    atomically(&chain.store, |db| {
        accrual_distribution::set_withdraw_address(db, &ALICE, &CAROL)
    })
    .unwrap();
    chain.allocate(VALIDATOR, "30");

    assert_eq!(chain.withdraw(VALIDATOR, ALICE, 2).unwrap(), coins(30));
    assert_eq!(chain.bank.balance(&CAROL), coins(30));
    assert!(chain.bank.balance(&ALICE).is_empty());
}

#[test]
fn failed_credit_leaves_no_trace() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 2, 1);
    chain.allocate(VALIDATOR, "9");
    chain.bank.block(ALICE);

    let before = chain.snapshot();

    match chain.withdraw(VALIDATOR, ALICE, 3) {
        Err(DistributionError::Bank(BankError::Blocked(account))) => assert_eq!(account, ALICE),
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(chain.snapshot(), before);
    assert_eq!(chain.rewards(VALIDATOR, ALICE, 3), uatom("9"));
    chain.assert_consistent();
}

#[test]
fn export_does_not_touch_the_store() {
    let mut chain = Chain::with_validators(&[VALIDATOR, OTHER_VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 10, 1);
    chain.delegate(ALICE, OTHER_VALIDATOR, 5, 1);
    chain.delegate(BOB, VALIDATOR, 10, 1);
    chain.allocate(VALIDATOR, "15");
    chain.allocate(OTHER_VALIDATOR, "2.5");

    let before = chain.snapshot();

    let export =
        export_all_rewards_for_delegator(&chain.store, &chain.staking, &ALICE, BlockHeight::new(2))
            .unwrap();

    assert_eq!(chain.snapshot(), before);
    assert_eq!(export.entries.len(), 2);
    assert_eq!(export.entries[0].validator, VALIDATOR);
    assert_eq!(export.entries[0].rewards, uatom("7.5"));
    assert_eq!(export.entries[0].payout, coins(7));
    assert_eq!(export.entries[1].validator, OTHER_VALIDATOR);
    assert_eq!(export.entries[1].rewards, uatom("2.5"));
    assert_eq!(export.total_payout(), coins(9));

    assert_eq!(
        serde_json::to_value(&export.entries[1].payout).unwrap(),
        json!({ "uatom": "2" })
    );
}

#[test]
fn clamp_to_outstanding_rewards() {
    let mut chain = Chain::with_validators(&[VALIDATOR]);

    chain.delegate(ALICE, VALIDATOR, 1, 1);
    chain.allocate(VALIDATOR, "10");

    // Simulate truncation drift having eaten into the pool.
    atomically(&chain.store, |db| {
        outstanding_rewards::put(db, &VALIDATOR, &outstanding_rewards::Row::new(uatom("9.5")))
    })
    .unwrap();

    let payout = accrual_tracing_json::assert_events(
        || chain.withdraw(VALIDATOR, ALICE, 2),
        "accrual::distribution::withdraw",
        vec![
            json!({
                "name": "withdraw.clamped",
                "level": "INFO",
                "validator": VALIDATOR.to_string(),
                "delegator": ALICE.to_string(),
                "expected": uatom("10").to_string(),
                "clamped": uatom("9.5").to_string(),
            }),
            json!({
                "name": "withdraw",
                "level": "DEBUG",
                "validator": VALIDATOR.to_string(),
                "delegator": ALICE.to_string(),
                "recipient": ALICE.to_string(),
                "payout": coins(9).to_string(),
                "remainder": uatom("0.5").to_string(),
            }),
        ],
    )
    .unwrap();

    assert_eq!(payout, coins(9));
    assert_eq!(chain.community_pool(), uatom("0.5"));
    assert!(chain.outstanding(VALIDATOR).is_empty());
}
