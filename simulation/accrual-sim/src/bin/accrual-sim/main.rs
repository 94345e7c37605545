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


use accrual_sim::simulator::{self, initialize_logs, Args};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logs(args.json_logs);

    let report = simulator::run(&args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
