//! Derived projections over checkpoints.
//!
//! Everything here follows the same exact-arithmetic rule as estimation:
//! integer ratios, never floating division. Only display formatting rounds,
//! and only by truncation.
use chrono::{DateTime, Utc};

use crate::{Checkpoint, EngineError, FlowRate, ResultEngine, TimeInterval, TokenAmount};

/// Estimates when an account balance depletes if the caller replaces
/// `current_outflow` with `new_outflow` and credits `extra_deposit` at
/// update time.
///
/// `account` is the account's net balance checkpoint (signed net rate,
/// inflows positive). The net outflow after the change is
/// `-net_rate - current_outflow + new_outflow`; if it is not positive the
/// balance never depletes and the estimate is `None`.
///
/// Returns the depletion time as unix seconds. The division floors, so the
/// estimate never reports a later-than-true date. A depletion beyond the
/// representable time horizon is reported as `None`.
pub fn depletion_time(
    account: &Checkpoint,
    current_outflow: FlowRate,
    new_outflow: FlowRate,
    extra_deposit: TokenAmount,
) -> ResultEngine<Option<i64>> {
    let overflow = || EngineError::InvalidCheckpoint("depletion estimate overflow".to_string());

    if extra_deposit.is_negative() {
        return Err(EngineError::InvalidAmount(
            "deposit must be non-negative".to_string(),
        ));
    }

    let net_outflow = account
        .rate_per_second()
        .units_per_second()
        .checked_neg()
        .and_then(|rate| rate.checked_sub(current_outflow.units_per_second()))
        .and_then(|rate| rate.checked_add(new_outflow.units_per_second()))
        .ok_or_else(overflow)?;

    if net_outflow <= 0 {
        return Ok(None);
    }

    let starting = account
        .base_amount()
        .checked_add(extra_deposit)
        .ok_or_else(overflow)?;

    let seconds = starting.units() / net_outflow;
    let Ok(seconds) = i64::try_from(seconds) else {
        return Ok(None);
    };

    Ok(account.base_timestamp().checked_add(seconds))
}

/// [`depletion_time`] as a `chrono` timestamp for presentation.
pub fn depletion_date(
    account: &Checkpoint,
    current_outflow: FlowRate,
    new_outflow: FlowRate,
    extra_deposit: TokenAmount,
) -> ResultEngine<Option<DateTime<Utc>>> {
    let estimate = depletion_time(account, current_outflow, new_outflow, extra_deposit)?;
    Ok(estimate.and_then(|seconds| DateTime::from_timestamp(seconds, 0)))
}

/// Balance a sender should hold before opening a stream at `rate`: three
/// months of streaming. Non-positive rates need no reserve.
pub fn suggested_reserve(rate: FlowRate) -> ResultEngine<TokenAmount> {
    if !rate.is_positive() {
        return Ok(TokenAmount::ZERO);
    }

    rate.amount_over(3 * TimeInterval::Month.seconds())
        .ok_or_else(|| EngineError::InvalidAmount("reserve overflow".to_string()))
}
