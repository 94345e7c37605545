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

//! Period-indexed accrual and settlement of delegation rewards.
//!
//! Each validator keeps a cumulative reward-per-token ratio, snapshotted every time its period
//! closes. A delegation only remembers the period it started from and the stake it held then;
//! its rewards are the difference of two snapshots times that stake, split around any slash
//! recorded in between. Snapshots are reference-counted and dropped once nothing anchors to them.
//!
//! All operations work against a [`store::TransactionalContext`]; run state transitions through
//! [`store::atomically`] so that a [`Fatal`] error leaves nothing behind.

pub mod allocation;
pub mod context;
pub mod delegation;
pub mod errors;
pub mod export;
pub mod historical;
pub mod hooks;
pub mod invariants;
pub mod period;
pub mod query;
pub mod rewards;
pub mod slashes;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod withdraw;

pub use allocation::allocate_to_validator;
pub use context::{Bank, BankError, StakingRegistry};
pub use delegation::{initialize_delegation, StartingInfo};
pub use errors::{DistributionError, Fatal};
pub use export::{export_all_rewards_for_delegator, ExportedRewards, RewardsExport};
pub use historical::HistoricalRecord;
pub use period::{close_period, initialize_validator, remove_validator};
pub use rewards::{calculate_delegation_rewards, calculate_rewards_between};
pub use slashes::{record_slash, SlashEvent};
pub use withdraw::{set_withdraw_address, withdraw_address, withdraw_delegation_rewards};
