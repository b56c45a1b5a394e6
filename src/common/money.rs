use bigdecimal::{BigDecimal, ToPrimitive};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::common::error::ValidationError;

const SCALE: i64 = 100;

/// Longest amount text accepted before parsing.
const MAX_INPUT_LEN: usize = 32;

/// A monetary value stored in the smallest currency unit (cents).
///
/// Amounts are kept as integers so that sums over thousands of entries never
/// drift. Text input goes through `BigDecimal` and is rounded to two decimal
/// places before being scaled.
///
/// # Examples
/// ```
/// use finance_ledger::common::money::Money;
///
/// let amount = Money::new(1050);
/// assert_eq!(amount.cents(), 1050);
/// assert_eq!(amount.to_string_2dp(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest magnitude a single amount may have: 99 999 999 999.99.
    ///
    /// Every value up to this bound is stored exactly by the JSON number
    /// form, and roughly 900 000 such amounts still sum inside an `i64`.
    pub const MAX: Money = Money(9_999_999_999_999);

    pub fn new(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `true` when the magnitude is at most [`Money::MAX`].
    pub fn in_range(&self) -> bool {
        self.0.unsigned_abs() <= Self::MAX.0.unsigned_abs()
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn to_string_2dp(&self) -> String {
        let bd = BigDecimal::from(self.0) / BigDecimal::from(SCALE);
        format!("{:.2}", bd)
    }

    /// Parses user supplied text into a non-negative amount.
    ///
    /// This is the validation boundary for amounts. Only plain decimal text
    /// is accepted (`12`, `12.5`, `.5`), with `,` allowed as the decimal
    /// separator when it is the only one. Exponents, thousands separators,
    /// values below zero and values above [`Money::MAX`] are rejected.
    ///
    /// ```
    /// use finance_ledger::common::money::Money;
    ///
    /// assert_eq!(Money::parse_amount("12.5").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse_amount("12,5").unwrap().cents(), 1250);
    /// assert!(Money::parse_amount("abc").is_err());
    /// assert!(Money::parse_amount("-5").is_err());
    /// assert!(Money::parse_amount("1e5").is_err());
    /// ```
    pub fn parse_amount(input: &str) -> Result<Money, ValidationError> {
        let t = input.trim();
        let bd = parse_decimal(t)?;
        // "-0.001" rounds to zero but was still typed as a negative number
        if bd < BigDecimal::from(0) {
            return Err(ValidationError::NegativeAmount(t.to_string()));
        }
        scale_to_cents(bd, t)
    }

    fn as_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl std::str::FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        scale_to_cents(parse_decimal(t)?, t)
    }
}

fn parse_decimal(t: &str) -> Result<BigDecimal, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(t.to_string());
    if t.len() > MAX_INPUT_LEN {
        return Err(invalid());
    }
    let text = with_dot_separator(t).ok_or_else(invalid)?;
    plain_decimal(&text)
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())
}

/// A lone `,` is read as the decimal point; any other use of `,` is refused.
fn with_dot_separator(t: &str) -> Option<Cow<'_, str>> {
    match (t.matches(',').count(), t.contains('.')) {
        (0, _) => Some(Cow::Borrowed(t)),
        (1, false) => Some(Cow::Owned(t.replacen(',', ".", 1))),
        _ => None,
    }
}

/// Accepts an optional sign, digits and an optional fraction, and returns
/// the canonical `[-]int[.frac]` form. Exponents are not accepted.
fn plain_decimal(text: &str) -> Option<String> {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
        return None;
    }
    let int = if int.is_empty() { "0" } else { int };
    Some(if frac.is_empty() {
        format!("{sign}{int}")
    } else {
        format!("{sign}{int}.{frac}")
    })
}

fn scale_to_cents(bd: BigDecimal, t: &str) -> Result<Money, ValidationError> {
    // Scale to 2 decimal places
    let scaled = (bd * BigDecimal::from(SCALE)).round(0);
    scaled
        .to_i64()
        .map(Money)
        .filter(Money::in_range)
        .ok_or_else(|| ValidationError::InvalidAmount(t.to_string()))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_2dp())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(SCALE)
            .map(Money)
            .filter(Money::in_range)
            .ok_or_else(|| E::custom(format!("amount out of range: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(format!("amount out of range: {v}")))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // shortest round-trip representation, so 0.1 stays "0.1"
        self.visit_str(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// Saturating so a misuse can never panic; ledger totals are kept inside the
// i64 range by the add and update handlers.
impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
