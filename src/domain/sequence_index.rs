//! Big-integer sequence indices carried as decimal strings
//!
//! Backends assign every message a monotonically increasing position that may
//! exceed the range of a 64-bit float (and sometimes of a `u64`). Values travel
//! as decimal strings and are compared here digit-wise, never through a native
//! number.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A non-negative decimal integer of arbitrary size
///
/// The inner string is always canonical: ASCII digits only, no leading zeros,
/// and `"0"` for zero. `"0"` doubles as the "unindexed" sentinel on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SequenceIndex(String);

impl SequenceIndex {
    /// The zero value, also used as the "nothing loaded yet" watermark
    pub fn zero() -> Self {
        Self(String::from("0"))
    }

    /// Parse a decimal string, returning `None` for anything that is not a
    /// non-negative integer
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = raw.trim_start_matches('0');
        if trimmed.is_empty() {
            Some(Self::zero())
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Parse a wire value that must name a real position, i.e. anything but `"0"`
    pub fn parse_assigned(raw: &str) -> Option<Self> {
        Self::parse(raw).filter(|index| !index.is_sentinel())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved `"0"` value
    pub fn is_sentinel(&self) -> bool {
        self.0 == "0"
    }

    /// The next index (`self + 1`)
    pub fn successor(&self) -> Self {
        let mut digits = self.0.clone().into_bytes();
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                return Self::from_digits(digits);
            }
        }
        digits.insert(0, b'1');
        Self::from_digits(digits)
    }

    /// `self - other`, or zero when `other >= self`
    pub fn saturating_sub(&self, other: &Self) -> Self {
        if self <= other {
            return Self::zero();
        }

        let lhs = self.0.as_bytes();
        let rhs = other.0.as_bytes();
        let offset = lhs.len() - rhs.len();
        let mut result = vec![b'0'; lhs.len()];
        let mut borrow = 0u8;

        for i in (0..lhs.len()).rev() {
            let minuend = lhs[i] - b'0';
            let subtrahend = (if i >= offset { rhs[i - offset] - b'0' } else { 0 }) + borrow;
            if minuend >= subtrahend {
                result[i] = b'0' + (minuend - subtrahend);
                borrow = 0;
            } else {
                result[i] = b'0' + (minuend + 10 - subtrahend);
                borrow = 1;
            }
        }

        let first_non_zero = result.iter().position(|d| *d != b'0').unwrap_or(result.len() - 1);
        Self::from_digits(result.split_off(first_non_zero))
    }

    /// Whether `self - other` is strictly greater than `threshold`
    pub fn exceeds_by(&self, other: &Self, threshold: u64) -> bool {
        self.saturating_sub(other) > Self::from(threshold)
    }

    /// The larger of two indices
    pub fn max_of(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    // Only called with ASCII digits that are already canonical.
    fn from_digits(digits: Vec<u8>) -> Self {
        Self(digits.into_iter().map(char::from).collect())
    }
}

impl Default for SequenceIndex {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for SequenceIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical form means a longer string is always the larger number.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for SequenceIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SequenceIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::InvalidSequenceIndex(s.to_owned()))
    }
}

impl TryFrom<String> for SequenceIndex {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SequenceIndex> for String {
    fn from(value: SequenceIndex) -> Self {
        value.0
    }
}

impl From<u64> for SequenceIndex {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}
