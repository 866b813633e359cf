//! Deci-degree fixed-point helpers for the session recorder.
//!
//! Temperatures are stored as `i16` at x10 scale (225.5 -> 2255) so a data
//! point stays at 13 bytes. All thresholds on the storage path compare in
//! this one integer unit.

/// Quantize degrees to deci-degrees, rounding to nearest and clamping to the
/// `i16` range. Non-finite values (NaN/+-Inf) map to 0.
#[inline]
pub fn deci_from_degrees(t: f32) -> i16 {
    if !t.is_finite() {
        return 0;
    }
    let scaled = (t * 10.0).round();
    if scaled >= i16::MAX as f32 {
        i16::MAX
    } else if scaled <= i16::MIN as f32 {
        i16::MIN
    } else {
        scaled as i16
    }
}

/// Expand deci-degrees back to degrees.
#[inline]
pub fn degrees_from_deci(d: i16) -> f32 {
    f32::from(d) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_at_extremes() {
        assert_eq!(deci_from_degrees(40_000.0), i16::MAX);
        assert_eq!(deci_from_degrees(-40_000.0), i16::MIN);
    }

    #[test]
    fn non_finite_maps_to_zero() {
        assert_eq!(deci_from_degrees(f32::NAN), 0);
        assert_eq!(deci_from_degrees(f32::INFINITY), 0);
        assert_eq!(deci_from_degrees(f32::NEG_INFINITY), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(deci_from_degrees(225.54), 2255);
        assert_eq!(deci_from_degrees(225.55), 2256);
        assert_eq!(deci_from_degrees(-0.06), -1);
    }

    #[test]
    fn round_trips_representable_values() {
        for d in [-32767i16, -1, 0, 1, 2255, 32767] {
            assert_eq!(deci_from_degrees(degrees_from_deci(d)), d);
        }
    }
}
