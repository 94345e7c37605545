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


use super::{
    check_block, delegator_addresses, generate_blocks, validator_addresses, Args, Block, Failure,
    Report, World,
};
use accrual_kernel::ValidatorAddress;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};

const EVENT_TARGET: &str = "accrual::sim::run";

pub fn run(args: &Args) -> anyhow::Result<Report> {
    let seed = args.seed();
    let mut rng = StdRng::seed_from_u64(seed);

    let validators = validator_addresses(args.number_of_validators);
    let delegators = delegator_addresses(args.number_of_delegators);
    let blocks = generate_blocks(&mut rng, args, &validators, &delegators);

    info!(
        target: EVENT_TARGET,
        seed,
        blocks = blocks.len(),
        validators = validators.len(),
        delegators = delegators.len(),
        "simulate"
    );

    simulate(seed, &validators, &blocks)
}

/// Replay blocks on a fresh world, stopping at the first block after which a check fails. Only
/// failures to read back the final balances are reported as errors; engine failures end up in
/// the report.
pub fn simulate(
    seed: u64,
    validators: &[ValidatorAddress],
    blocks: &[Block],
) -> anyhow::Result<Report> {
    let mut world = World::new(validators)?;
    let mut report = Report::new(seed);

    for block in blocks {
        report.blocks += 1;

        let result = block
            .actions
            .iter()
            .try_for_each(|action| {
                let outcome = world.apply(block.height, action)?;
                report.actions.record(action, outcome);
                Ok::<_, anyhow::Error>(())
            })
            .and_then(|()| check_block(&world));

        if let Err(e) = result {
            let reason = format!("{e:#}");
            error!(target: EVENT_TARGET, height = %block.height, %reason, "failure");
            report.failure = Some(Failure {
                height: block.height,
                reason,
                actions: block.actions.clone(),
            });
            break;
        }
    }

    report.settle(&world)?;

    info!(
        target: EVENT_TARGET,
        blocks = report.blocks,
        paid = %report.paid,
        community_pool = %report.community_pool,
        success = report.is_success(),
        "simulated"
    );

    Ok(report)
}
