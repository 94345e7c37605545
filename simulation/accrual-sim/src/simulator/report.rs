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


use super::{Action, Outcome, World};
use accrual_kernel::{BlockHeight, Coins, DecCoins};
use serde::Serialize;

/// Summary of a simulation run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub seed: u64,
    pub blocks: u64,
    pub actions: Tally,
    pub allocated: DecCoins,
    pub outstanding: DecCoins,
    pub community_pool: DecCoins,
    pub paid: Coins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub allocations: u64,
    pub delegations: u64,
    pub redelegations: u64,
    pub slashes: u64,
    pub withdrawals: u64,
    pub skipped: u64,
}

/// The first block after which a check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub height: BlockHeight,
    pub reason: String,
    pub actions: Vec<Action>,
}

impl Report {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            blocks: 0,
            actions: Tally::default(),
            allocated: DecCoins::new(),
            outstanding: DecCoins::new(),
            community_pool: DecCoins::new(),
            paid: Coins::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Record the final balances of the world.
    pub fn settle(&mut self, world: &World) -> anyhow::Result<()> {
        self.allocated = world.allocated().clone();
        self.outstanding = world.outstanding()?;
        self.community_pool = world.community_pool()?;
        self.paid = world.paid();
        Ok(())
    }
}

impl Tally {
    pub fn record(&mut self, action: &Action, outcome: Outcome) {
        if let Outcome::Skipped(_) = outcome {
            self.skipped += 1;
            return;
        }

        let counter = match action {
            Action::Allocate { .. } => &mut self.allocations,
            Action::Delegate { .. } => &mut self.delegations,
            Action::Redelegate { .. } => &mut self.redelegations,
            Action::Slash { .. } => &mut self.slashes,
            Action::Withdraw { .. } => &mut self.withdrawals,
        };
        *counter += 1;
    }
}
