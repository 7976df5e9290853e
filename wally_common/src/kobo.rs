use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NAIRA_CURRENCY_CODE: &str = "NGN";

const KOBO_PER_NAIRA: i64 = 100;

//--------------------------------------        Kobo         ---------------------------------------------------------
/// A naira amount held as a whole number of kobo (1/100 NGN). All wallet arithmetic happens on this type, so
/// balances never pass through a binary float.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Kobo(i64);

op!(binary Kobo, Add, add);
op!(binary Kobo, Sub, sub);
op!(inplace Kobo, AddAssign, add_assign);
op!(inplace Kobo, SubAssign, sub_assign);
op!(unary Kobo, Neg, neg);

/// # Panics
/// If the product does not fit in an `i64`, in release builds too. Use [`Kobo::checked_mul`] for untrusted factors.
impl Mul<i64> for Kobo {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        match self.checked_mul(rhs) {
            Some(v) => v,
            None => panic!("Kobo overflow: {self} * {rhs}"),
        }
    }
}

impl Sum for Kobo {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in kobo: {0}")]
pub struct KoboConversionError(String);

impl From<i64> for Kobo {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Kobo {
    type Error = KoboConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| KoboConversionError(format!("Value {value} is too large to convert to Kobo")))
    }
}

/// Parses a naira amount as typed by a user or sent by a provider: `"100"`, `"₦1,500.5"`, `"0.25"`.
/// At most two decimal places are accepted.
impl FromStr for Kobo {
    type Err = KoboConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().trim_start_matches('₦').replace(',', "");
        let err = || KoboConversionError(format!("'{s}' is not a valid naira amount"));
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        if frac.len() > 2 {
            return Err(KoboConversionError(format!("'{s}' has more than two decimal places")));
        }
        let naira = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
        let kobo = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        let value = naira.checked_mul(KOBO_PER_NAIRA).and_then(|v| v.checked_add(kobo)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for Kobo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}₦{}.{:02}", abs / 100, abs % 100)
    }
}

impl Kobo {
    pub const fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_naira(naira: i64) -> Self {
        Self(naira * KOBO_PER_NAIRA)
    }

    /// Whole naira, truncated towards zero.
    pub fn naira(&self) -> i64 {
        self.0 / KOBO_PER_NAIRA
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}
