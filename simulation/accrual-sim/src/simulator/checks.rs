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


use super::World;
use accrual_distribution::invariants;
use anyhow::{bail, Context};

/// Everything that must hold once a block has been applied.
pub fn check_block(world: &World) -> anyhow::Result<()> {
    invariants::check_all(world.store()).context("broken ledger invariant")?;
    check_conservation(world)
}

/// Rewards are never created nor destroyed: whatever was allocated is either still outstanding,
/// in the community pool, or paid out.
pub fn check_conservation(world: &World) -> anyhow::Result<()> {
    let accounted = world
        .outstanding()?
        .add(&world.community_pool()?)
        .add(&world.paid().to_dec_coins());

    if &accounted != world.allocated() {
        bail!(
            "rewards are not conserved: allocated {} but {} are accounted for",
            world.allocated(),
            accounted
        );
    }

    Ok(())
}
