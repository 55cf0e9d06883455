//! The module contains the accrual checkpoint and flowing-amount estimation.
use serde::{Deserialize, Serialize};

use crate::{EngineError, FlowRate, ResultEngine, TokenAmount, util::parse_units};

/// Last known-correct basis for a continuously accruing quantity.
///
/// A checkpoint is an immutable `(amount, timestamp, rate)` triple taken
/// from the upstream ledger. The true value at any later time `t` is
/// `base_amount + rate_per_second * (t - base_timestamp)`; [`estimate`]
/// computes exactly that, clamping elapsed time at zero so accrual is never
/// computed backward.
///
/// Checkpoints are replaced wholesale whenever the upstream source reports
/// a new basis (rate or base changed) and never mutated in place, so every
/// replacement resets the extrapolation basis. Estimation carries no state
/// across checkpoints: re-rendering callers simply call [`estimate`] again
/// with the latest checkpoint and the current time.
///
/// # Examples
///
/// ```rust
/// use engine::{Checkpoint, FlowRate, TokenAmount};
///
/// let cp = Checkpoint::new(TokenAmount::new(1000), 0, FlowRate::new(7)).unwrap();
/// assert_eq!(cp.estimate(10).unwrap().units(), 1070);
/// ```
///
/// [`estimate`]: Checkpoint::estimate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    base_amount: TokenAmount,
    base_timestamp: i64,
    rate_per_second: FlowRate,
}

impl Checkpoint {
    /// Creates a checkpoint from a known-correct basis.
    ///
    /// The base amount must be non-negative; a negative base is a contract
    /// violation on the upstream source and yields `InvalidCheckpoint`.
    pub fn new(
        base_amount: TokenAmount,
        base_timestamp: i64,
        rate_per_second: FlowRate,
    ) -> ResultEngine<Self> {
        if base_amount.is_negative() {
            return Err(EngineError::InvalidCheckpoint(format!(
                "negative base amount: {}",
                base_amount.units()
            )));
        }

        Ok(Self {
            base_amount,
            base_timestamp,
            rate_per_second,
        })
    }

    /// Returns the amount known to be correct as of [`base_timestamp`].
    ///
    /// [`base_timestamp`]: Checkpoint::base_timestamp
    #[must_use]
    pub const fn base_amount(&self) -> TokenAmount {
        self.base_amount
    }

    /// Returns the unix timestamp (seconds) the basis was recorded at.
    #[must_use]
    pub const fn base_timestamp(&self) -> i64 {
        self.base_timestamp
    }

    /// Returns the accrual rate effective from the base timestamp onward.
    #[must_use]
    pub const fn rate_per_second(&self) -> FlowRate {
        self.rate_per_second
    }

    /// Extrapolates the current amount at `now` (unix seconds).
    ///
    /// Pure integer arithmetic; safe to call on every refresh tick. If
    /// `now` precedes the base timestamp the elapsed time clamps to zero
    /// and the base amount is returned unchanged.
    ///
    /// The only failure is 128-bit overflow of the rate-times-elapsed
    /// product or the final sum, which no sane checkpoint can produce and
    /// is therefore reported as a contract violation.
    pub fn estimate(&self, now: i64) -> ResultEngine<TokenAmount> {
        let elapsed = now.saturating_sub(self.base_timestamp).max(0);

        self.rate_per_second
            .amount_over(elapsed)
            .and_then(|accrued| self.base_amount.checked_add(accrued))
            .ok_or_else(|| {
                EngineError::InvalidCheckpoint(format!(
                    "amount overflow extrapolating {elapsed}s past {}",
                    self.base_timestamp
                ))
            })
    }
}

impl TryFrom<&api_types::snapshot::AccountTokenSnapshot> for Checkpoint {
    type Error = EngineError;

    /// Basis for an account's live balance: balance at last update plus the
    /// signed **net** flow rate across all of the account's streams.
    fn try_from(snapshot: &api_types::snapshot::AccountTokenSnapshot) -> ResultEngine<Self> {
        Checkpoint::new(
            TokenAmount::new(parse_units(&snapshot.balance_until_updated_at, "balance")?),
            snapshot.updated_at_timestamp,
            FlowRate::new(parse_units(&snapshot.total_net_flow_rate, "net flow rate")?),
        )
    }
}

impl TryFrom<&api_types::outflow::Outflow> for Checkpoint {
    type Error = EngineError;

    /// Basis for the total a single outgoing stream has transferred.
    fn try_from(outflow: &api_types::outflow::Outflow) -> ResultEngine<Self> {
        Checkpoint::new(
            TokenAmount::new(parse_units(&outflow.streamed_until_updated_at, "streamed total")?),
            outflow.updated_at_timestamp,
            FlowRate::new(parse_units(&outflow.current_flow_rate, "flow rate")?),
        )
    }
}

impl TryFrom<&api_types::inflow::Inflow> for Checkpoint {
    type Error = EngineError;

    /// Basis for the total a recipient has received across all inbound
    /// streams.
    fn try_from(inflow: &api_types::inflow::Inflow) -> ResultEngine<Self> {
        Checkpoint::new(
            TokenAmount::new(parse_units(
                &inflow.total_amount_streamed_in_until_updated_at,
                "streamed-in total",
            )?),
            inflow.updated_at_timestamp,
            FlowRate::new(parse_units(&inflow.total_inflow_rate, "inflow rate")?),
        )
    }
}

impl TryFrom<&api_types::pool::MatchingPool> for Checkpoint {
    type Error = EngineError;

    /// Basis for the total a matching pool has distributed.
    fn try_from(pool: &api_types::pool::MatchingPool) -> ResultEngine<Self> {
        Checkpoint::new(
            TokenAmount::new(parse_units(
                &pool.total_amount_flowed_distributed_until_updated_at,
                "distributed total",
            )?),
            pool.updated_at_timestamp,
            FlowRate::new(parse_units(&pool.flow_rate, "pool flow rate")?),
        )
    }
}

impl Checkpoint {
    /// Basis for the total a pool member has received.
    ///
    /// Pool members do not carry their own rate on the wire; the caller
    /// supplies the member's share of the pool flow.
    pub fn for_pool_member(
        member: &api_types::pool::PoolMember,
        member_flow_rate: FlowRate,
    ) -> ResultEngine<Self> {
        Checkpoint::new(
            TokenAmount::new(parse_units(
                &member.total_amount_received_until_updated_at,
                "received total",
            )?),
            member.updated_at_timestamp,
            member_flow_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(base: i128, timestamp: i64, rate: i128) -> Checkpoint {
        Checkpoint::new(TokenAmount::new(base), timestamp, FlowRate::new(rate)).unwrap()
    }

    #[test]
    fn extrapolates_exactly() {
        let cp = checkpoint(1000, 0, 7);
        assert_eq!(cp.estimate(10).unwrap().units(), 1070);
    }

    #[test]
    fn extrapolates_wei_scale_values() {
        let cp = checkpoint(500_000_000_000_000_000, 1000, 100_000);
        assert_eq!(cp.estimate(1100).unwrap().units(), 500_000_000_010_000_000);
    }

    #[test]
    fn monotonic_for_non_negative_rates() {
        let cp = checkpoint(1_000_000, 100, 42);
        let mut last = cp.estimate(100).unwrap();
        for now in [101, 150, 1_000, 1_000_000] {
            let next = cp.estimate(now).unwrap();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn never_accrues_backward() {
        let cp = checkpoint(1000, 500, 7);
        assert_eq!(cp.estimate(499).unwrap().units(), 1000);
        assert_eq!(cp.estimate(0).unwrap().units(), 1000);
        assert_eq!(cp.estimate(i64::MIN).unwrap().units(), 1000);
    }

    #[test]
    fn negative_rates_drain() {
        let cp = checkpoint(1000, 0, -7);
        assert_eq!(cp.estimate(10).unwrap().units(), 930);
    }

    #[test]
    fn replacement_resets_basis() {
        let old = checkpoint(1000, 0, 7);
        assert_eq!(old.estimate(10).unwrap().units(), 1070);

        // A new upstream basis replaces the old one wholesale; estimation
        // uses the new triple exclusively, with no residual offset.
        let new = checkpoint(2000, 10, 1);
        assert_eq!(new.estimate(20).unwrap().units(), 2010);
    }

    #[test]
    fn rejects_negative_base() {
        let result = Checkpoint::new(TokenAmount::new(-1), 0, FlowRate::ZERO);
        assert!(matches!(result, Err(EngineError::InvalidCheckpoint(_))));
    }

    #[test]
    fn overflow_is_a_contract_violation() {
        let cp = checkpoint(0, 0, i128::MAX);
        assert!(matches!(
            cp.estimate(2),
            Err(EngineError::InvalidCheckpoint(_))
        ));
    }

    #[test]
    fn converts_account_snapshot() {
        let snapshot = api_types::snapshot::AccountTokenSnapshot {
            balance_until_updated_at: "500000000000000000".to_string(),
            updated_at_timestamp: 1000,
            total_net_flow_rate: "-100000".to_string(),
        };

        let cp = Checkpoint::try_from(&snapshot).unwrap();
        assert_eq!(cp.base_amount().units(), 500_000_000_000_000_000);
        assert_eq!(cp.base_timestamp(), 1000);
        assert_eq!(cp.rate_per_second().units_per_second(), -100_000);
    }

    #[test]
    fn rejects_malformed_snapshot() {
        let snapshot = api_types::snapshot::AccountTokenSnapshot {
            balance_until_updated_at: "0.5".to_string(),
            updated_at_timestamp: 1000,
            total_net_flow_rate: "0".to_string(),
        };

        assert!(matches!(
            Checkpoint::try_from(&snapshot),
            Err(EngineError::InvalidCheckpoint(_))
        ));
    }
}
