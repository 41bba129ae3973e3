//! Fixed-precision monetary values.
//!
//! Held as integer hundredths so that grid round trips and equality checks
//! are exact; the sheet itself stores plain numeric magnitudes.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount with exactly two fractional digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_hundredths(n: i64) -> Self {
        Money(n)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Construct from a raw numeric magnitude, rounding half-away-from-zero
    /// to two places (`12.345` becomes `12.35`).
    pub fn from_f64(v: f64) -> Self {
        Money((v * 100.0).round() as i64)
    }

    /// The plain numeric magnitude written back to the sheet.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let n = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", n / 100, n % 100)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(Money::from_f64(12.345), Money::from_hundredths(1235));
        assert_eq!(Money::from_f64(12.344), Money::from_hundredths(1234));
        assert_eq!(Money::from_f64(-0.005), Money::from_hundredths(-1));
    }

    #[test]
    fn display() {
        assert_eq!(Money::from_hundredths(1235).to_string(), "12.35");
        assert_eq!(Money::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Money::from_hundredths(-230).to_string(), "-2.30");
    }

    #[test]
    fn magnitude_round_trip() {
        let m = Money::from_f64(12.345);
        assert_eq!(m.to_f64(), 12.35);
        assert_eq!(Money::from_f64(m.to_f64()), m);
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_hundredths(150);
        let b = Money::from_hundredths(75);
        assert_eq!(a + b, Money::from_hundredths(225));
        assert_eq!(a - b, Money::from_hundredths(75));
        assert_eq!(-a, Money::from_hundredths(-150));
        assert_eq!([a, b].into_iter().sum::<Money>(), Money::from_hundredths(225));
    }
}
