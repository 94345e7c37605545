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

//! The slash event log. Every slash closes the validator's period so that rewards accrued before
//! it are computed at the pre-slash stake; the closed period stays referenced by the event.

use crate::{
    context::StakingRegistry,
    errors::Fatal,
    historical,
    period::close_period,
    store::{
        columns::{current_rewards, slash_events},
        ReadStore, TransactionalContext,
    },
};
use accrual_kernel::{BlockHeight, Decimal, Period, ValidatorAddress};
use tracing::{info, instrument, Level};

pub use slash_events::Row as SlashEvent;

const EVENT_TARGET: &str = "accrual::distribution::slashes";

/// Record a slash of `fraction` of the validator's stake at the given height. Several slashes
/// within the same height and period compound into a single event.
#[instrument(level = Level::TRACE, skip_all, fields(validator = %validator, height = %height))]
pub fn record_slash<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
    height: BlockHeight,
    fraction: &Decimal,
) -> Result<Period, Fatal> {
    if fraction.is_negative() || fraction >= &Decimal::one() {
        return Err(Fatal::InvalidSlashFraction(fraction.clone()));
    }

    let latest = current_rewards::get(db, validator)?
        .ok_or(Fatal::MissingCurrentRewards(*validator))?
        .period
        .previous();

    let (period, fraction) = match slash_events::get(db, validator, height, latest)? {
        Some(existing) => {
            // 1 - (1 - f0)(1 - f1)
            let remaining = &(&Decimal::one() - &existing.fraction) * &(&Decimal::one() - fraction);
            (latest, &Decimal::one() - &remaining)
        }
        None => {
            let period = close_period(db, staking, validator)?;
            historical::increment_reference(db, validator, period)?;
            (period, fraction.clone())
        }
    };

    info!(
        target: EVENT_TARGET,
        %validator,
        %height,
        %period,
        %fraction,
        "record_slash"
    );

    slash_events::put(db, validator, height, &SlashEvent::new(period, fraction))?;

    Ok(period)
}

/// Slash events of a validator with heights in `[from, to]`, lazily decoded in the order they
/// were applied.
pub fn events_between<'a>(
    db: &'a impl ReadStore,
    validator: &ValidatorAddress,
    from: BlockHeight,
    to: BlockHeight,
) -> Result<impl Iterator<Item = Result<(BlockHeight, SlashEvent), Fatal>> + 'a, Fatal> {
    Ok(slash_events::iter_between(db, validator, from, to)?
        .map(|entry| {
            entry
                .map(|(_, height, event)| (height, event))
                .map_err(Fatal::from)
        }))
}
