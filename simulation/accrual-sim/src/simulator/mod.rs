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


//! Replay randomly generated blocks against the distribution engine, checking after every block
//! that the ledger invariants hold and that no reward was created or lost along the way.

mod args;
mod checks;
mod generate;
mod report;
mod run;
mod world;

pub use args::{initialize_logs, Args};
pub use checks::{check_block, check_conservation};
pub use generate::{delegator_addresses, generate_blocks, validator_addresses, Action, Block};
pub use report::{Failure, Report, Tally};
pub use run::{run, simulate};
pub use world::{Outcome, World};
