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


use accrual_sim::simulator::{
    self, delegator_addresses, generate_blocks, validator_addresses, Args, Report,
};
use clap::Parser;
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn args(seed: u64, blocks: u64) -> Args {
    Args::try_parse_from([
        "accrual-sim".to_string(),
        format!("--seed={seed}"),
        format!("--number-of-blocks={blocks}"),
        "--number-of-validators=3".to_string(),
        "--number-of-delegators=6".to_string(),
        "--slash-probability=0.1".to_string(),
        "--withdraw-probability=0.3".to_string(),
    ])
    .unwrap()
}

fn assert_conserved(report: &Report) {
    assert!(report.is_success(), "simulation failed: {:?}", report.failure);
    assert_eq!(
        report.allocated,
        report
            .outstanding
            .add(&report.community_pool)
            .add(&report.paid.to_dec_coins())
    );
}

#[test]
fn long_run_conserves_rewards() {
    let report = simulator::run(&args(42, 400)).unwrap();

    assert_eq!(report.blocks, 400);
    assert_eq!(report.actions.allocations, 400);
    assert!(report.actions.delegations > 0);
    assert!(report.actions.slashes > 0);
    assert!(report.actions.withdrawals > 0);
    assert!(!report.paid.is_empty());
    assert_conserved(&report);
}

#[test]
fn same_seed_same_report() {
    assert_eq!(
        simulator::run(&args(7, 100)).unwrap(),
        simulator::run(&args(7, 100)).unwrap()
    );
}

#[test]
fn replay_generated_blocks() {
    let args = args(3, 50);
    let validators = validator_addresses(args.number_of_validators);
    let delegators = delegator_addresses(args.number_of_delegators);
    let blocks = generate_blocks(&mut StdRng::seed_from_u64(3), &args, &validators, &delegators);

    let report = simulator::simulate(3, &validators, &blocks).unwrap();

    assert_eq!(report, simulator::run(&args).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_seed_conserves_rewards(seed in any::<u64>()) {
        let report = simulator::run(&args(seed, 60)).unwrap();
        prop_assert!(report.is_success(), "simulation failed: {:?}", report.failure);
        prop_assert_eq!(
            &report.allocated,
            &report
                .outstanding
                .add(&report.community_pool)
                .add(&report.paid.to_dec_coins())
        );
    }
}
