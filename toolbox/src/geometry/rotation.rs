//! Rotations and linear maps of 2D/3D coordinates.

use glam::{DMat2, DMat3, DVec2, DVec3};

use crate::error::{check_len, Error, Result};
use crate::quantity::Quantity;

/// Rotate `v` by `angle` with the matrix `[[cos, sin], [−sin, cos]]`.
///
/// A positive angle rotates the vector clockwise (equivalently, rotates the
/// coordinate frame counter-clockwise).
pub fn rotate2d(v: DVec2, angle: f64) -> DVec2 {
    let (s, c) = angle.sin_cos();
    DMat2::from_cols(DVec2::new(c, -s), DVec2::new(s, c)) * v
}

/// Rotate `v` about x, then y, then z: `Rz · Ry · Rx · v`.
pub fn rotate3d(v: DVec3, theta_x: f64, theta_y: f64, theta_z: f64) -> DVec3 {
    let rotation =
        DMat3::from_rotation_z(theta_z) * DMat3::from_rotation_y(theta_y) * DMat3::from_rotation_x(theta_x);
    rotation * v
}

/// Sky coordinates rotated onto the axes of an object with position angle `pa`.
///
/// `x` points West, `y` North, and the position angle is measured from North
/// through East. The returned `x` runs along the major axis and `y` along the
/// minor axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedPoints {
    pub x: Quantity<Vec<f64>>,
    pub y: Quantity<Vec<f64>>,
    /// Propagated uncertainties, when input errors were given.
    pub errors: Option<(Quantity<Vec<f64>>, Quantity<Vec<f64>>)>,
}

fn position_angle_matrix(pa: f64) -> DMat2 {
    let (s, c) = pa.sin_cos();
    // Rows [−sin, cos] and [−cos, −sin].
    DMat2::from_cols(DVec2::new(-s, -c), DVec2::new(c, -s))
}

fn check_pair(x: &Quantity<Vec<f64>>, y: &Quantity<Vec<f64>>, what: &'static str) -> Result<()> {
    check_len(what, x.value.len(), y.value.len())?;
    if x.unit != y.unit {
        return Err(Error::InvalidParameter {
            name: what,
            reason: format!("x and y units differ ({:?} vs {:?})", x.unit, y.unit),
        });
    }
    Ok(())
}

fn apply(matrix: DMat2, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .map(|(&x, &y)| {
            let r = matrix * DVec2::new(x, y);
            (r.x, r.y)
        })
        .unzip()
}

/// Rotate `(x, y)` onto the major/minor axes for position angle `pa`.
///
/// `pa` is in radians unless it carries an angular unit. Units of `x` and `y`
/// are kept.
pub fn position_angle_rotation(
    pa: &Quantity<f64>,
    x: &Quantity<Vec<f64>>,
    y: &Quantity<Vec<f64>>,
) -> Result<RotatedPoints> {
    check_pair(x, y, "coordinates")?;
    let rotation = position_angle_matrix(pa.to_radians()?);
    let (rx, ry) = apply(rotation, &x.value, &y.value);
    Ok(RotatedPoints {
        x: Quantity { value: rx, unit: x.unit },
        y: Quantity { value: ry, unit: y.unit },
        errors: None,
    })
}

/// [`position_angle_rotation`] with uncorrelated errors propagated as
/// `sqrt(R² · [dx², dy²])` (element-wise square of the rotation).
pub fn position_angle_rotation_with_errors(
    pa: &Quantity<f64>,
    x: &Quantity<Vec<f64>>,
    y: &Quantity<Vec<f64>>,
    dx: &Quantity<Vec<f64>>,
    dy: &Quantity<Vec<f64>>,
) -> Result<RotatedPoints> {
    check_pair(dx, dy, "errors")?;
    check_len("errors", x.value.len(), dx.value.len())?;

    let mut rotated = position_angle_rotation(pa, x, y)?;
    let rotation = position_angle_matrix(pa.to_radians()?);
    let squared = DMat2::from_cols(rotation.x_axis * rotation.x_axis, rotation.y_axis * rotation.y_axis);

    let dx2: Vec<f64> = dx.value.iter().map(|v| v * v).collect();
    let dy2: Vec<f64> = dy.value.iter().map(|v| v * v).collect();
    let (ex, ey) = apply(squared, &dx2, &dy2);
    rotated.errors = Some((
        Quantity {
            value: ex.into_iter().map(f64::sqrt).collect(),
            unit: dx.unit,
        },
        Quantity {
            value: ey.into_iter().map(f64::sqrt).collect(),
            unit: dy.unit,
        },
    ));
    Ok(rotated)
}

/// Apply the affine map `p` to the points `(x, y)`.
///
/// `p[0..2]` is the translation; `p[2..6]` are the matrix entries in column
/// order, so `x' = p0 + p2·x + p4·y` and `y' = p1 + p3·x + p5·y`.
pub fn linear_transformation(p: &[f64; 6], x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    check_len("y coordinates", x.len(), y.len())?;
    let translation = DVec2::new(p[0], p[1]);
    let matrix = DMat2::from_cols_array(&[p[2], p[3], p[4], p[5]]);
    Ok(x.iter()
        .zip(y)
        .map(|(&x, &y)| {
            let r = translation + matrix * DVec2::new(x, y);
            (r.x, r.y)
        })
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Unit;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-12
    }

    #[test]
    fn test_rotate2d_matrix_convention() {
        assert!(close(rotate2d(DVec2::X, FRAC_PI_2), DVec2::new(0.0, -1.0)));
        assert!(close(rotate2d(DVec2::Y, FRAC_PI_2), DVec2::new(1.0, 0.0)));
        let v = DVec2::new(3.0, -4.0);
        assert!((rotate2d(v, 1.234).length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate3d_order() {
        // x-rotation first sends y to z, then the z-rotation leaves it alone.
        let v = rotate3d(DVec3::Y, FRAC_PI_2, 0.0, FRAC_PI_2);
        assert!((v - DVec3::Z).length() < 1e-12);
        // z-rotation alone is counter-clockwise about z.
        let w = rotate3d(DVec3::X, 0.0, 0.0, FRAC_PI_2);
        assert!((w - DVec3::Y).length() < 1e-12);
        let u = rotate3d(DVec3::Z, 0.0, FRAC_PI_2, 0.0);
        assert!((u - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_position_angle_rotation_zero_pa() {
        // pa = 0: major axis points North, so x' = y and y' = −x.
        let x = Quantity::new(vec![1.0, 0.0], Unit::Arcsec);
        let y = Quantity::new(vec![0.0, 2.0], Unit::Arcsec);
        let r = position_angle_rotation(&Quantity::new(0.0, Unit::Degree), &x, &y).unwrap();
        assert_eq!(r.x.unit, Some(Unit::Arcsec));
        assert!((r.x.value[0] - 0.0).abs() < 1e-12 && (r.y.value[0] + 1.0).abs() < 1e-12);
        assert!((r.x.value[1] - 2.0).abs() < 1e-12 && (r.y.value[1] - 0.0).abs() < 1e-12);
        assert!(r.errors.is_none());
    }

    #[test]
    fn test_position_angle_rotation_preserves_length() {
        let x = Quantity::dimensionless(vec![3.0]);
        let y = Quantity::dimensionless(vec![4.0]);
        let r = position_angle_rotation(&Quantity::dimensionless(0.7), &x, &y).unwrap();
        assert!((r.x.value[0].hypot(r.y.value[0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_angle_errors_propagate() {
        let x = Quantity::new(vec![1.0], Unit::Milliarcsec);
        let y = Quantity::new(vec![1.0], Unit::Milliarcsec);
        let dx = Quantity::new(vec![0.3], Unit::Milliarcsec);
        let dy = Quantity::new(vec![0.4], Unit::Milliarcsec);

        // 45 degrees mixes both errors equally.
        let pa = Quantity::new(45.0, Unit::Degree);
        let r = position_angle_rotation_with_errors(&pa, &x, &y, &dx, &dy).unwrap();
        let (ex, ey) = r.errors.unwrap();
        let expected = (0.5 * (0.09 + 0.16_f64)).sqrt();
        assert!((ex.value[0] - expected).abs() < 1e-12);
        assert!((ey.value[0] - expected).abs() < 1e-12);

        // 90 degrees only flips signs, leaving the errors in place.
        let pa = Quantity::new(PI / 2.0, Unit::Radian);
        let r = position_angle_rotation_with_errors(&pa, &x, &y, &dx, &dy).unwrap();
        let (ex, ey) = r.errors.unwrap();
        assert!((ex.value[0] - 0.3).abs() < 1e-12);
        assert!((ey.value[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_position_angle_rejects_mixed_units() {
        let x = Quantity::new(vec![1.0], Unit::Arcsec);
        let y = Quantity::new(vec![1.0], Unit::Degree);
        assert!(position_angle_rotation(&Quantity::dimensionless(0.0), &x, &y).is_err());
        let pc = Quantity::new(1.0, Unit::Pc);
        assert!(position_angle_rotation(&pc, &x, &x).is_err());
    }

    #[test]
    fn test_linear_transformation() {
        // Translate by (1, 2), scale x by 2, shear y into x.
        let p = [1.0, 2.0, 2.0, 0.0, 0.5, 1.0];
        let (x, y) = linear_transformation(&p, &[1.0, 0.0], &[0.0, 2.0]).unwrap();
        assert_eq!(x, vec![3.0, 2.0]);
        assert_eq!(y, vec![2.0, 4.0]);
        assert!(linear_transformation(&p, &[1.0], &[]).is_err());
    }
}
