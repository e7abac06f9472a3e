use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Currency amount (KES) as a fixed-point decimal with 4 decimal places,
/// stored as a scaled integer.
///
/// Serialized as a plain JSON number so stored records stay readable by
/// anything that treats `totalSpent` as a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;

    pub const ZERO: Amount = Amount(0);

    /// Convert a decimal value, rounding to the scale. `None` for NaN,
    /// infinities, and values whose scaled form does not fit in `i64`.
    pub fn from_float(value: f64) -> Option<Self> {
        let scaled = (value * Self::SCALE as f64).round();
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(Amount(scaled as i64))
    }

    /// Whole currency units, e.g. `Amount::from_units(500)` is 500.0000 KES.
    pub fn from_units(units: u64) -> Self {
        let units = i64::try_from(units).unwrap_or(i64::MAX / Self::SCALE);
        Amount(units.saturating_mul(Self::SCALE))
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Number of complete `step`-unit blocks in a non-negative amount.
    /// Negative amounts yield zero.
    pub fn whole_blocks_of(self, step: u64) -> u64 {
        if self.0 <= 0 || step == 0 {
            return 0;
        }
        let step = i64::try_from(step)
            .ok()
            .and_then(|s| s.checked_mul(Self::SCALE));
        match step {
            Some(step) => (self.0 / step) as u64,
            None => 0,
        }
    }

    /// `percent`% of this amount, truncated to the scale.
    pub fn percent(self, percent: u8) -> Self {
        Amount((self.0 as i128 * percent as i128 / 100) as i64)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        let whole = abs / scale;
        let frac = abs % scale;
        write!(f, "{sign}{whole}.{frac:04}")
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_float())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::from_float(value).ok_or_else(|| {
            serde::de::Error::custom(format!("amount {value} is not finite or out of range"))
        })
    }
}
