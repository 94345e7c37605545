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


use clap::Parser;
use rand::Rng;
use tracing_subscriber::EnvFilter;

/// Log filter used when `ACCRUAL_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "error,accrual=info";

#[derive(Debug, Parser, Clone)]
#[clap(name = "Accrual Simulator")]
#[clap(bin_name = "accrual-sim")]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Seed for the block generator; a random one is drawn when absent.
    #[arg(long, env = "ACCRUAL_SEED")]
    pub seed: Option<u64>,

    /// Number of blocks to generate and replay.
    #[arg(
        long,
        default_value = "200",
        env = "ACCRUAL_NUMBER_OF_BLOCKS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub number_of_blocks: u64,

    #[arg(
        long,
        default_value = "3",
        env = "ACCRUAL_NUMBER_OF_VALIDATORS",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub number_of_validators: u16,

    #[arg(
        long,
        default_value = "8",
        env = "ACCRUAL_NUMBER_OF_DELEGATORS",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub number_of_delegators: u16,

    /// Probability for a block to slash a validator.
    #[arg(
        long,
        default_value = "0.05",
        env = "ACCRUAL_SLASH_PROBABILITY",
        value_parser = parse_probability
    )]
    pub slash_probability: f64,

    /// Probability for a block to carry a reward withdrawal.
    #[arg(
        long,
        default_value = "0.2",
        env = "ACCRUAL_WITHDRAW_PROBABILITY",
        value_parser = parse_probability
    )]
    pub withdraw_probability: f64,

    /// Emit logs as JSON rather than compact text.
    #[arg(long, env = "ACCRUAL_JSON_LOGS")]
    pub json_logs: bool,
}

impl Args {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random::<u64>())
    }
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let probability: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(format!("{probability} is not within [0, 1]"))
    }
}

/// Install a stderr formatter, filtered by `ACCRUAL_LOG` (default: [`DEFAULT_LOG_FILTER`]).
pub fn initialize_logs(as_json: bool) {
    let filter = EnvFilter::try_from_env("ACCRUAL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let formatter = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if as_json {
        let _ = formatter.json().try_init();
    } else {
        let _ = formatter.compact().try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["accrual-sim"]).unwrap();
        assert_eq!(args.number_of_blocks, 200);
        assert_eq!(args.number_of_validators, 3);
        assert_eq!(args.number_of_delegators, 8);
        assert!(!args.json_logs);
    }

    #[test]
    fn explicit_seed_is_kept() {
        let args = Args::try_parse_from(["accrual-sim", "--seed", "42"]).unwrap();
        assert_eq!(args.seed(), 42);
    }

    #[test_case("0" ; "never")]
    #[test_case("0.25" ; "sometimes")]
    #[test_case("1" ; "always")]
    fn accept_probability(value: &str) {
        assert!(parse_probability(value).is_ok());
    }

    #[test_case("-0.1" ; "negative")]
    #[test_case("1.5" ; "above one")]
    #[test_case("often" ; "not a number")]
    fn reject_probability(value: &str) {
        assert!(parse_probability(value).is_err());
    }

    #[test]
    fn reject_empty_validator_set() {
        assert!(Args::try_parse_from(["accrual-sim", "--number-of-validators", "0"]).is_err());
    }
}
