use serde::{Deserialize, Serialize};

/// An on-chain account reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Lowercase hex address.
    pub id: String,
}

pub mod snapshot {
    use super::*;

    /// Account-level token snapshot reported by the streaming ledger.
    ///
    /// Integer quantities arrive as base-10 strings in the token's smallest
    /// unit; the source never reports floating-point values.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountTokenSnapshot {
        /// Balance known to be correct as of `updated_at_timestamp`.
        pub balance_until_updated_at: String,
        /// Unix seconds the snapshot was recorded at.
        pub updated_at_timestamp: i64,
        /// Signed net rate across all of the account's streams
        /// (inflows positive).
        pub total_net_flow_rate: String,
    }
}

pub mod outflow {
    use super::*;

    /// A sender's outgoing stream to a single recipient.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Outflow {
        pub streamed_until_updated_at: String,
        pub updated_at_timestamp: i64,
        pub current_flow_rate: String,
    }
}

pub mod inflow {
    use super::*;

    /// A recipient's aggregate over all inbound streams.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Inflow {
        pub total_amount_streamed_in_until_updated_at: String,
        pub updated_at_timestamp: i64,
        pub total_inflow_rate: String,
    }
}

pub mod pool {
    use super::*;

    /// A recipient's membership in a matching pool.
    ///
    /// Members carry no flow rate of their own; their share of the pool
    /// flow is derived from pool units elsewhere.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PoolMember {
        pub account: Account,
        pub total_amount_received_until_updated_at: String,
        pub updated_at_timestamp: i64,
    }

    /// A sender distributing into a matching pool.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PoolDistributor {
        pub account: Account,
        pub flow_rate: String,
    }

    /// A matching pool and its live distribution state.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MatchingPool {
        pub flow_rate: String,
        pub total_amount_flowed_distributed_until_updated_at: String,
        pub updated_at_timestamp: i64,
        #[serde(default)]
        pub pool_members: Vec<PoolMember>,
        #[serde(default)]
        pub pool_distributors: Vec<PoolDistributor>,
    }
}
