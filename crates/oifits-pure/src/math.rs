//! Tolerance-based float comparison and small geometry helpers.
//!
//! Binary round-tripping through 32-bit table cells introduces noise well
//! below 1e-6, so comparisons throughout the crate go through [`equals`] /
//! [`greater_than`] rather than raw operators.

/// Default comparison tolerance.
pub const EPSILON: f64 = 1e-6;

/// Returns true if `a` and `b` are equal within [`EPSILON`].
pub fn equals(a: f64, b: f64) -> bool {
    equals_eps(a, b, EPSILON)
}

/// Returns true if `a == b` or `|a - b| < epsilon`.
///
/// The exact-equality arm makes infinities compare equal to themselves.
pub fn equals_eps(a: f64, b: f64, epsilon: f64) -> bool {
    (a == b) || libm::fabs(a - b) < epsilon
}

/// Returns true if `a` is greater than `b` beyond [`EPSILON`] noise.
pub fn greater_than(a: f64, b: f64) -> bool {
    greater_than_eps(a, b, EPSILON)
}

/// Returns true if `(a + epsilon - b) > 0`.
pub fn greater_than_eps(a: f64, b: f64, epsilon: f64) -> bool {
    a + epsilon - b > 0.0
}

/// Euclidean norm of a 2-vector.
pub fn norm2(x: f64, y: f64) -> f64 {
    libm::sqrt(x * x + y * y)
}

/// Euclidean norm of a 3-vector.
pub fn norm3(x: f64, y: f64, z: f64) -> f64 {
    libm::sqrt(x * x + y * y + z * z)
}

/// Converts a cartesian position to spherical `(longitude, latitude, distance)`
/// in radians and input units.
///
/// A zero-length vector yields `(0, 0, 0)`.
pub fn cartesian_to_spherical(position: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = position;
    let dist = norm3(x, y, z);
    if dist == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let lon = libm::atan2(y, x);
    let lat = libm::asin(z / dist);
    (lon, lat, dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- equals ----

    #[test]
    fn equals_within_default_tolerance() {
        assert!(equals(1.000_000_1, 1.0));
        assert!(equals(1.0, 1.000_000_1));
    }

    #[test]
    fn equals_rejects_beyond_tolerance() {
        assert!(!equals(1.001, 1.0));
    }

    #[test]
    fn equals_exact_values() {
        assert!(equals(0.0, 0.0));
        assert!(equals(-3.5, -3.5));
        assert!(equals(f64::INFINITY, f64::INFINITY));
    }

    #[test]
    fn equals_nan_is_never_equal() {
        assert!(!equals(f64::NAN, f64::NAN));
        assert!(!equals(f64::NAN, 1.0));
    }

    #[test]
    fn equals_custom_epsilon() {
        assert!(equals_eps(1.05, 1.0, 0.1));
        assert!(!equals_eps(1.05, 1.0, 0.01));
    }

    // ---- greater_than ----

    #[test]
    fn greater_than_clear_cases() {
        assert!(greater_than(2.0, 1.0));
        assert!(!greater_than(1.0, 2.0));
    }

    #[test]
    fn greater_than_is_tolerant_near_equality() {
        // a nominally smaller by less than epsilon still passes
        assert!(greater_than(1.0, 1.000_000_5));
        assert!(!greater_than(1.0, 1.000_01));
    }

    #[test]
    fn greater_than_equal_values() {
        assert!(greater_than(1.0, 1.0));
    }

    // ---- geometry ----

    #[test]
    fn norm2_pythagorean() {
        assert!(equals(norm2(3.0, 4.0), 5.0));
    }

    #[test]
    fn norm3_unit_axes() {
        assert!(equals(norm3(1.0, 0.0, 0.0), 1.0));
        assert!(equals(norm3(0.0, 0.0, -2.0), 2.0));
    }

    #[test]
    fn spherical_of_x_axis() {
        let (lon, lat, dist) = cartesian_to_spherical([1.0, 0.0, 0.0]);
        assert!(equals(lon, 0.0));
        assert!(equals(lat, 0.0));
        assert!(equals(dist, 1.0));
    }

    #[test]
    fn spherical_of_y_axis() {
        let (lon, lat, dist) = cartesian_to_spherical([0.0, 2.0, 0.0]);
        assert!(equals(lon, core::f64::consts::FRAC_PI_2));
        assert!(equals(lat, 0.0));
        assert!(equals(dist, 2.0));
    }

    #[test]
    fn spherical_of_pole() {
        let (_, lat, dist) = cartesian_to_spherical([0.0, 0.0, 3.0]);
        assert!(equals(lat, core::f64::consts::FRAC_PI_2));
        assert!(equals(dist, 3.0));
    }

    #[test]
    fn spherical_of_origin() {
        assert_eq!(cartesian_to_spherical([0.0, 0.0, 0.0]), (0.0, 0.0, 0.0));
    }
}
