pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;

    /// Relative comparison: `|self - other| <= tolerance * max(|self|, |other|)`.
    fn relative_eq(self, other: Self, tolerance: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn relative_eq(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance * self.abs().max(other.abs())
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn relative_eq(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance * self.abs().max(other.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_approximately_eq() {
        assert!(1.0_f64.approximately_eq(1.0));
        assert!(0.0_f64.approximately_eq(0.0));
        assert!((0.1_f64 + 0.2_f64).approximately_eq(0.3));
        assert!(!1.0_f64.approximately_eq(1.0001));
    }

    #[test]
    fn nan_is_never_equal() {
        assert!(!f64::NAN.approximately_eq(f64::NAN));
        assert!(!f64::NAN.relative_eq(1.0, 1.0));
    }

    #[test]
    fn relative_eq_scales_with_magnitude() {
        assert!(1000.0_f64.relative_eq(1000.5, 1e-3));
        assert!(!1.0_f64.relative_eq(1.5, 1e-3));
        assert!(0.0_f64.relative_eq(0.0, 1e-3));
        assert!(10.0_f32.relative_eq(10.001, 1e-3));
    }
}
