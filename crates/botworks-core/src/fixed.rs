use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time. Also used for the
/// caller-supplied timestamps stamped onto new machines.
pub type Ticks = u64;

/// Build a Fixed64 from a whole number at compile time.
pub const fn fixed_int(v: i32) -> Fixed64 {
    Fixed64::from_bits((v as i64) << 32)
}

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Euclidean distance between two points.
///
/// Squares are taken on the raw bits in 128-bit space (Q64.64), so no
/// intermediate value overflows for any pair of in-range coordinates.
pub fn distance(ax: Fixed64, ay: Fixed64, bx: Fixed64, by: Fixed64) -> Fixed64 {
    let root = raw_distance(raw_delta(ax, bx), raw_delta(ay, by));
    Fixed64::from_bits(root.min(i64::MAX as u128) as i64)
}

/// `b - a` on the raw bits, widened so it cannot overflow.
pub(crate) fn raw_delta(a: Fixed64, b: Fixed64) -> i128 {
    b.to_bits() as i128 - a.to_bits() as i128
}

/// Length of a raw-bit offset, unclamped. Saturates only when both axes
/// span nearly the whole coordinate range.
pub(crate) fn raw_distance(dx: i128, dy: i128) -> u128 {
    let dx = dx.unsigned_abs();
    let dy = dy.unsigned_abs();
    dx.saturating_mul(dx)
        .saturating_add(dy.saturating_mul(dy))
        .isqrt()
}

/// Serde adapter that writes a Fixed64 as a plain float.
///
/// Used on hand-edited settings (speeds, window sizes) so data files read
/// `speed = 0.05` instead of raw bit patterns.
pub mod as_f64 {
    use super::Fixed64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Fixed64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Fixed64::checked_from_num(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("{raw} is out of fixed-point range")))
    }
}
