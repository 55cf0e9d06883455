//! Time intervals used to quote streaming amounts in human terms.
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Interval a user quotes a streaming amount over ("X per month").
///
/// `Month` is a 365-day year divided in 12 (2,628,000 seconds), matching how
/// monthly figures are displayed to donors; it is **not** 30 days.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl TimeInterval {
    /// Returns the exact number of seconds in the interval.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Day => 86_400,
            Self::Week => 604_800,
            Self::Month => 2_628_000,
            Self::Year => 31_536_000,
        }
    }

    /// Returns the canonical interval string used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl TryFrom<&str> for TimeInterval {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(EngineError::InvalidAmount(format!(
                "unknown interval: {value}"
            ))),
        }
    }
}
