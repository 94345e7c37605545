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

//! The historical ratio ledger: an append-only, reference-counted map from (validator, period) to
//! the cumulative reward ratio as of that period. Records are only ever removed explicitly, once
//! nothing refers to them anymore.

use crate::{
    errors::Fatal,
    store::{
        columns::{current_rewards, historical_rewards},
        ReadStore, TransactionalContext,
    },
};
use accrual_kernel::{Period, ValidatorAddress};
use tracing::trace;

pub use historical_rewards::Row as HistoricalRecord;

const EVENT_TARGET: &str = "accrual::distribution::historical";

/// Fetch a record; its absence means a caller asked for a period that was never recorded.
pub fn get(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<HistoricalRecord, Fatal> {
    historical_rewards::get(db, validator, period)?.ok_or(Fatal::MissingHistoricalRewards {
        validator: *validator,
        period,
    })
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
    record: &HistoricalRecord,
) -> Result<(), Fatal> {
    historical_rewards::put(db, validator, period, record)?;
    Ok(())
}

pub fn increment_reference<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<(), Fatal> {
    let mut record = get(db, validator, period)?;

    record.reference_count = record.reference_count.checked_add(1).ok_or(
        Fatal::ReferenceCountOverflow {
            validator: *validator,
            period,
        },
    )?;

    trace!(
        target: EVENT_TARGET,
        %validator,
        %period,
        reference_count = record.reference_count,
        "increment_reference"
    );

    put(db, validator, period, &record)
}

/// Release one reference. A record left unreferenced is deleted, unless it is the most recent
/// record of its validator: the latest period is implicitly referenced by the next close.
pub fn decrement_reference<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<(), Fatal> {
    let mut record = get(db, validator, period)?;

    record.reference_count = record.reference_count.checked_sub(1).ok_or(
        Fatal::ReferenceCountUnderflow {
            validator: *validator,
            period,
        },
    )?;

    trace!(
        target: EVENT_TARGET,
        %validator,
        %period,
        reference_count = record.reference_count,
        "decrement_reference"
    );

    put(db, validator, period, &record)?;

    if record.reference_count == 0 && !is_latest(db, validator, period)? {
        delete(db, validator, period)?;
    }

    Ok(())
}

/// Remove a record. Only legal once nothing references it anymore.
pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<(), Fatal> {
    let record = get(db, validator, period)?;

    if record.reference_count > 0 {
        return Err(Fatal::ReferencedHistoricalRewards {
            validator: *validator,
            period,
            reference_count: record.reference_count,
        });
    }

    trace!(target: EVENT_TARGET, %validator, %period, "delete");

    historical_rewards::delete(db, validator, period)?;
    Ok(())
}

/// Delete a record if, and only if, nothing references it. Returns whether it was deleted.
pub fn prune<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<bool, Fatal> {
    match historical_rewards::get(db, validator, period)? {
        Some(record) if record.reference_count == 0 => {
            delete(db, validator, period)?;
            Ok(true)
        }
        Some(..) | None => Ok(false),
    }
}

fn is_latest(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<bool, Fatal> {
    Ok(current_rewards::get(db, validator)?
        .is_some_and(|current| current.period == period.next()))
}
