//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into the half-open range (-pi, pi].
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    if angle > -T::PI() && angle <= T::PI() {
        return angle;
    }

    let wrapped = rem_euclid(angle + T::PI(), T::TAU()) - T::PI();

    if wrapped <= -T::PI() {
        wrapped + T::TAU()
    } else {
        wrapped
    }
}

/// Round a value to the nearest multiple of `resolution`, returning the number of multiples.
///
/// Halfway cases round away from zero.
pub fn round_to_multiple<T>(value: T, resolution: T) -> T
where
    T: Float,
{
    (value / resolution).round()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(5.0, 4.0), 1.0);
        assert_eq!(rem_euclid(-1.0, 4.0), 3.0);
        assert_eq!(rem_euclid(-4.0, 4.0), 0.0);
    }

    #[test]
    fn test_wrap_to_pi() {
        assert_eq!(wrap_to_pi(0.0), 0.0);
        assert_eq!(wrap_to_pi(PI), PI);
        assert_eq!(wrap_to_pi(-PI), PI);
        assert!((wrap_to_pi(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-12);
        assert!((wrap_to_pi(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(-TAU - 0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_round_to_multiple() {
        assert_eq!(round_to_multiple(0.94, 0.1), 9.0);
        assert_eq!(round_to_multiple(-0.26, 0.5), -1.0);
        assert_eq!(round_to_multiple(3.0, 1.0), 3.0);
    }
}
