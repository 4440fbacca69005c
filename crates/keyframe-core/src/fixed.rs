use fixed::types::I16F16;

/// 16.16 fixed-point: the unit of every coordinate, height, offset and speed.
pub type Fixed = I16F16;

/// Binary angle. A full turn spans the whole `u32` range.
pub type Angle = u32;

/// Number of fractional bits in [`Fixed`].
pub const FRACBITS: u32 = 16;

/// Build a Fixed from a whole map unit count. Wraps outside the 16.16 range.
#[inline]
pub fn fixed_from_int(v: i32) -> Fixed {
    Fixed::from_bits(v.wrapping_shl(FRACBITS))
}

/// Convert an f64 to Fixed. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed(v: f64) -> Fixed {
    Fixed::from_num(v)
}

/// Convert Fixed to f64. Use only for display.
#[inline]
pub fn fixed_to_f64(v: Fixed) -> f64 {
    v.to_num::<f64>()
}
