//! Adaptive hyper-grid over the objective space.
//!
//! Each objective axis is discretized independently against the archive's
//! current `[min, max]` on that axis: `k` successive bisections, emitting
//! `1` when the value lies in the upper half (and narrowing to it) and `0`
//! otherwise. The price code forms the high `k` bits of a [`GridLocation`],
//! the queue-time code the low `k` bits.
//!
//! # Reference
//! Knowles & Corne (2000), "Approximating the Nondominated Front Using the
//! Pareto Archived Evolution Strategy"

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PaesError, Result};

/// Upper bound on bits per axis (two axes must fit in a `u64`).
pub const MAX_LOCATION_BITS: u32 = 32;

/// Hyper-grid cell code of `2k` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridLocation(u64);

impl GridLocation {
    /// Concatenates per-axis codes of `bits` bits each.
    pub fn from_codes(price_code: u64, queue_code: u64, bits: u32) -> Self {
        Self((price_code << bits) | queue_code)
    }

    /// Raw cell code.
    pub fn code(&self) -> u64 {
        self.0
    }

    /// Price-axis code.
    pub fn price_code(&self, bits: u32) -> u64 {
        self.0 >> bits
    }

    /// Queue-time-axis code.
    pub fn queue_code(&self, bits: u32) -> u64 {
        self.0 & axis_mask(bits)
    }
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

fn axis_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Observed `[min, max]` of one objective axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl AxisRange {
    /// Creates a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Tightest range covering `values`; `None` when empty.
    pub fn covering(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| {
            Some(match acc {
                None => Self::new(v, v),
                Some(r) => Self::new(r.min.min(v), r.max.max(v)),
            })
        })
    }

    /// Whether `value` lies within the range (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Encodes `value` into a `bits`-bit axis code.
    ///
    /// A zero-width range encodes every value to `0`.
    ///
    /// # Example
    /// ```
    /// use u_paes::paes::AxisRange;
    ///
    /// let axis = AxisRange::new(0.0, 8.0);
    /// assert_eq!(axis.encode(5.0, 3).unwrap(), 0b101);
    /// assert!(axis.encode(9.0, 3).is_err());
    /// ```
    pub fn encode(&self, value: f64, bits: u32) -> Result<u64> {
        if !self.contains(value) {
            return Err(PaesError::InvalidLocation {
                value,
                min: self.min,
                max: self.max,
            });
        }
        if self.span() <= 0.0 {
            return Ok(0);
        }

        let (mut lo, mut hi) = (self.min, self.max);
        let mut code = 0u64;
        for _ in 0..bits {
            let mid = lo + (hi - lo) / 2.0;
            code <<= 1;
            if value >= mid {
                code |= 1;
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bisection() {
        let axis = AxisRange::new(0.0, 8.0);
        assert_eq!(axis.encode(0.0, 3).unwrap(), 0b000);
        assert_eq!(axis.encode(8.0, 3).unwrap(), 0b111);
        assert_eq!(axis.encode(4.0, 3).unwrap(), 0b100);
        assert_eq!(axis.encode(5.0, 3).unwrap(), 0b101);
        assert_eq!(axis.encode(3.9, 3).unwrap(), 0b011);
    }

    #[test]
    fn test_encode_out_of_range() {
        let axis = AxisRange::new(1.0, 2.0);
        let err = axis.encode(0.5, 4).unwrap_err();
        assert_eq!(
            err,
            PaesError::InvalidLocation {
                value: 0.5,
                min: 1.0,
                max: 2.0
            }
        );
        assert!(axis.encode(f64::NAN, 4).is_err());
    }

    #[test]
    fn test_encode_degenerate_range() {
        let axis = AxisRange::new(3.0, 3.0);
        assert_eq!(axis.encode(3.0, 8).unwrap(), 0);
    }

    #[test]
    fn test_encode_full_width() {
        let axis = AxisRange::new(0.0, 1.0);
        assert_eq!(axis.encode(1.0, MAX_LOCATION_BITS).unwrap(), u64::from(u32::MAX));
    }

    #[test]
    fn test_covering() {
        let r = AxisRange::covering([3.0, -1.0, 7.5]).unwrap();
        assert_eq!(r, AxisRange::new(-1.0, 7.5));
        assert!((r.span() - 8.5).abs() < 1e-10);
        assert!(AxisRange::covering(std::iter::empty()).is_none());
    }

    #[test]
    fn test_location_codes() {
        let loc = GridLocation::from_codes(0b10, 0b01, 2);
        assert_eq!(loc.code(), 0b1001);
        assert_eq!(loc.price_code(2), 0b10);
        assert_eq!(loc.queue_code(2), 0b01);
        assert_eq!(loc.to_string(), "0x9");

        let wide = GridLocation::from_codes(1, u64::from(u32::MAX), 32);
        assert_eq!(wide.price_code(32), 1);
        assert_eq!(wide.queue_code(32), u64::from(u32::MAX));
    }
}
