//! Rational numbers for frame rates, time scales and durations

use std::fmt;

/// A fraction kept in lowest terms with a positive denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    /// Create a rational number, reduced to lowest terms.
    ///
    /// A zero denominator is stored as given.
    pub fn new(num: i64, den: i64) -> Self {
        if den == 0 {
            return Rational { num, den };
        }
        let sign = den.signum();
        let divisor = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        Rational {
            num: sign * num / divisor,
            den: sign * den / divisor,
        }
    }

    /// Whole number
    pub fn from_int(n: i64) -> Self {
        Rational { num: n, den: 1 }
    }

    /// Duration of `ticks` units of a stream clock running `rate` units per `scale` seconds
    pub fn from_ticks(ticks: u64, scale: u32, rate: u32) -> Self {
        Rational::new(ticks as i64 * scale as i64, rate as i64)
    }

    pub fn is_positive(self) -> bool {
        self.den > 0 && self.num > 0
    }

    /// Largest integer not greater than this value; zero for a zero denominator
    pub fn floor(self) -> i64 {
        if self.den == 0 {
            return 0;
        }
        self.num.div_euclid(self.den)
    }

    /// Split a frame rate into the `(scale, rate)` pair of a RIFF stream header,
    /// where one frame lasts `scale / rate` seconds.
    pub fn to_scale_and_rate(self) -> Option<(u32, u32)> {
        if !self.is_positive() {
            return None;
        }
        Some((u32::try_from(self.den).ok()?, u32::try_from(self.num).ok()?))
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::from_int(0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
