use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{EngineError, interval::TimeInterval};

/// Signed token amount represented in the token's **smallest unit**.
///
/// Use this type for **all** token quantities in the engine (balances,
/// streamed totals, deposits) to avoid floating-point drift. The token has
/// 18 decimals, so one whole token is `10^18` units.
///
/// The value is signed:
/// - positive = inflow / credit
/// - negative = outflow / debit
///
/// # Examples
///
/// ```rust
/// use engine::TokenAmount;
///
/// let amount = TokenAmount::new(1_500_000_000_000_000_000);
/// assert_eq!(amount.to_string(), "1.5");
/// ```
///
/// Parsing from user input (strips `,` group separators; rejects more than
/// 18 decimals):
///
/// ```rust
/// use engine::TokenAmount;
///
/// assert_eq!("10".parse::<TokenAmount>().unwrap().units(), 10 * 10i128.pow(18));
/// assert_eq!("1,000.5".parse::<TokenAmount>().unwrap().units(), 10005 * 10i128.pow(17));
/// assert!("0.0000000000000000001".parse::<TokenAmount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TokenAmount(i128);

/// Number of decimals in one whole token.
const DECIMALS: u32 = 18;
const UNIT: i128 = 10i128.pow(DECIMALS);
const UNIT_ABS: u128 = 10u128.pow(DECIMALS);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Creates a new amount from smallest-unit integers.
    #[must_use]
    pub const fn new(units: i128) -> Self {
        Self(units)
    }

    /// Returns the raw value in smallest units.
    #[must_use]
    pub const fn units(self) -> i128 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(rhs.0).map(TokenAmount)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(rhs.0).map(TokenAmount)
    }

    /// Formats the amount as an exact decimal string, trailing zeros
    /// trimmed (`1500000000000000000` units -> `"1.5"`).
    #[must_use]
    pub fn to_decimal(self) -> String {
        format_units(self.0, None, false)
    }

    /// Formats the amount truncated to at most `max_frac_digits` fractional
    /// digits.
    ///
    /// Truncation is toward zero and never rounds a displayed balance past
    /// its true value.
    #[must_use]
    pub fn truncated(self, max_frac_digits: usize) -> String {
        format_units(self.0, Some(max_frac_digits), false)
    }

    /// Like [`truncated`], with `,` thousands separators in the whole part
    /// (`"12,345.6789"`).
    ///
    /// [`truncated`]: TokenAmount::truncated
    #[must_use]
    pub fn grouped(self, max_frac_digits: usize) -> String {
        format_units(self.0, Some(max_frac_digits), true)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl From<i128> for TokenAmount {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for i128 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: TokenAmount) -> Self::Output {
        TokenAmount(self.0 + rhs.0)
    }
}

impl AddAssign for TokenAmount {
    fn add_assign(&mut self, rhs: TokenAmount) {
        self.0 += rhs.0;
    }
}

impl Sub for TokenAmount {
    type Output = TokenAmount;

    fn sub(self, rhs: TokenAmount) -> Self::Output {
        TokenAmount(self.0 - rhs.0)
    }
}

impl SubAssign for TokenAmount {
    fn sub_assign(&mut self, rhs: TokenAmount) {
        self.0 -= rhs.0;
    }
}

impl Neg for TokenAmount {
    type Output = TokenAmount;

    fn neg(self) -> Self::Output {
        TokenAmount(-self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = EngineError;

    /// Parses a human decimal string into smallest units.
    ///
    /// Accepts `,` thousands separators and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 18 fractional digits (rejects sub-unit precision)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim().replace(',', "");
        if rest.is_empty() {
            return Err(empty());
        }

        let mut parts = rest.split('.');
        let whole_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i128 = whole_str.parse().map_err(|_| invalid())?;

        let frac: i128 = match frac_str {
            None => 0,
            Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > DECIMALS as usize {
                    return Err(EngineError::InvalidAmount("too many decimals".to_string()));
                }
                let digits: i128 = frac.parse().map_err(|_| invalid())?;
                digits * 10i128.pow(DECIMALS - frac.len() as u32)
            }
        };

        let total = whole
            .checked_mul(UNIT)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(TokenAmount(signed))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<i128>()
            .map(TokenAmount)
            .map_err(|_| de::Error::custom(format!("invalid token amount: {raw}")))
    }
}

/// Streaming rate in smallest units **per second**.
///
/// Signed like [`TokenAmount`]: negative rates model net outflows. Rates and
/// amounts only ever combine through exact integer arithmetic; the checked
/// constructors return `None` on 128-bit overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FlowRate(i128);

impl FlowRate {
    pub const ZERO: FlowRate = FlowRate(0);

    /// Creates a new rate from smallest units per second.
    #[must_use]
    pub const fn new(units_per_second: i128) -> Self {
        Self(units_per_second)
    }

    /// Returns the raw value in smallest units per second.
    #[must_use]
    pub const fn units_per_second(self) -> i128 {
        self.0
    }

    /// Returns `true` if the rate is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the rate is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the rate is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Exact amount accrued over `seconds` (returns `None` on overflow).
    #[must_use]
    pub fn amount_over(self, seconds: i64) -> Option<TokenAmount> {
        self.0.checked_mul(seconds as i128).map(TokenAmount)
    }

    /// Exact amount accrued over one whole interval, e.g. the "per month"
    /// figure shown next to a stream.
    #[must_use]
    pub fn amount_per_interval(self, interval: TimeInterval) -> Option<TokenAmount> {
        self.amount_over(interval.seconds())
    }

    /// Rate that streams `amount` over one `interval`.
    ///
    /// The division truncates toward zero, so the resulting rate never
    /// streams more than the requested amount per interval.
    #[must_use]
    pub fn from_amount_per_interval(amount: TokenAmount, interval: TimeInterval) -> FlowRate {
        FlowRate(amount.units() / interval.seconds() as i128)
    }
}

impl fmt::Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s", TokenAmount(self.0).to_decimal())
    }
}

impl Add for FlowRate {
    type Output = FlowRate;

    fn add(self, rhs: FlowRate) -> Self::Output {
        FlowRate(self.0 + rhs.0)
    }
}

impl Sub for FlowRate {
    type Output = FlowRate;

    fn sub(self, rhs: FlowRate) -> Self::Output {
        FlowRate(self.0 - rhs.0)
    }
}

impl Neg for FlowRate {
    type Output = FlowRate;

    fn neg(self) -> Self::Output {
        FlowRate(-self.0)
    }
}

impl From<i128> for FlowRate {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

impl From<FlowRate> for i128 {
    fn from(value: FlowRate) -> Self {
        value.0
    }
}

impl Serialize for FlowRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FlowRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<i128>()
            .map(FlowRate)
            .map_err(|_| de::Error::custom(format!("invalid flow rate: {raw}")))
    }
}

fn format_units(units: i128, max_frac_digits: Option<usize>, group_thousands: bool) -> String {
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    let whole = abs / UNIT_ABS;
    let frac = abs % UNIT_ABS;

    let whole_str = if group_thousands {
        group_digits(&whole.to_string())
    } else {
        whole.to_string()
    };

    let mut frac_str = format!("{frac:018}");
    if let Some(max) = max_frac_digits {
        frac_str.truncate(max);
    }
    while frac_str.ends_with('0') {
        frac_str.pop();
    }

    if frac_str.is_empty() {
        format!("{sign}{whole_str}")
    } else {
        format!("{sign}{whole_str}.{frac_str}")
    }
}

fn group_digits(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*byte as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_exact_decimal() {
        assert_eq!(TokenAmount::new(0).to_string(), "0");
        assert_eq!(TokenAmount::new(1).to_string(), "0.000000000000000001");
        assert_eq!(TokenAmount::new(UNIT).to_string(), "1");
        assert_eq!(TokenAmount::new(15 * UNIT / 10).to_string(), "1.5");
        assert_eq!(TokenAmount::new(-15 * UNIT / 10).to_string(), "-1.5");
    }

    #[test]
    fn truncation_never_rounds_up() {
        let almost_two = TokenAmount::new(2 * UNIT - 1);
        assert_eq!(almost_two.truncated(4), "1.9999");
        assert_eq!(almost_two.truncated(0), "1");
        assert_eq!(TokenAmount::new(UNIT / 2).truncated(4), "0.5");
    }

    #[test]
    fn grouping_separates_thousands() {
        let amount = TokenAmount::new(1_234_567 * UNIT + UNIT / 4);
        assert_eq!(amount.grouped(2), "1,234,567.25");
        assert_eq!(TokenAmount::new(999 * UNIT).grouped(2), "999");
    }

    #[test]
    fn parse_accepts_commas_and_sign() {
        assert_eq!("10".parse::<TokenAmount>().unwrap().units(), 10 * UNIT);
        assert_eq!("1,000".parse::<TokenAmount>().unwrap().units(), 1000 * UNIT);
        assert_eq!("0.5".parse::<TokenAmount>().unwrap().units(), UNIT / 2);
        assert_eq!("-0.5".parse::<TokenAmount>().unwrap().units(), -(UNIT / 2));
        assert_eq!("+2.25".parse::<TokenAmount>().unwrap().units(), 9 * UNIT / 4);
        assert_eq!(" 2.30 ".parse::<TokenAmount>().unwrap().units(), 23 * UNIT / 10);
    }

    #[test]
    fn parse_rejects_sub_unit_precision() {
        assert!("0.0000000000000000001".parse::<TokenAmount>().is_err());
        assert!("1.1234567890123456789".parse::<TokenAmount>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<TokenAmount>().is_err());
        assert!("abc".parse::<TokenAmount>().is_err());
        assert!("1.2.3".parse::<TokenAmount>().is_err());
        assert!(".5".parse::<TokenAmount>().is_err());
    }

    #[test]
    fn rate_accrues_exactly() {
        let rate = FlowRate::new(7);
        assert_eq!(rate.amount_over(10).unwrap().units(), 70);
        assert_eq!(rate.amount_over(0).unwrap(), TokenAmount::ZERO);
        assert_eq!(FlowRate::new(-3).amount_over(10).unwrap().units(), -30);
    }

    #[test]
    fn rate_interval_conversions_truncate() {
        let monthly = TokenAmount::new(2_628_000);
        let rate = FlowRate::from_amount_per_interval(monthly, TimeInterval::Month);
        assert_eq!(rate.units_per_second(), 1);
        assert_eq!(
            rate.amount_per_interval(TimeInterval::Month).unwrap(),
            monthly
        );

        // A remainder is dropped, never rounded up.
        let rate = FlowRate::from_amount_per_interval(TokenAmount::new(2_628_001), TimeInterval::Month);
        assert_eq!(rate.units_per_second(), 1);
    }

    #[test]
    fn serde_uses_raw_unit_strings() {
        let amount = TokenAmount::new(500_000_000_000_000_000);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"500000000000000000\"");
        assert_eq!(serde_json::from_str::<TokenAmount>(&json).unwrap(), amount);

        let rate: FlowRate = serde_json::from_str("\"-100000\"").unwrap();
        assert_eq!(rate.units_per_second(), -100_000);
    }
}
