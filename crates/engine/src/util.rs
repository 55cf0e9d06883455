//! Internal helpers for wire-value conversion.
//!
//! These utilities are **not** part of the public API. They centralize the
//! string-to-integer parsing used when ingesting upstream checkpoint data.

use crate::{EngineError, ResultEngine};

/// Parse a base-10 integer reported by the upstream source and return a
/// labeled error on failure.
///
/// The source guarantees exact integers in string form; anything else is a
/// contract violation.
pub(crate) fn parse_units(value: &str, label: &str) -> ResultEngine<i128> {
    value
        .trim()
        .parse::<i128>()
        .map_err(|_| EngineError::InvalidCheckpoint(format!("invalid {label}: {value}")))
}
