//! Covariance ellipses, rotations, and linear maps of coordinates.

mod covariance;
mod ellipse;
mod rotation;

pub use covariance::covariance;
pub use ellipse::{cov_ellipse, Ellipse, DEFAULT_ELLIPSE_POINTS};
pub use rotation::{
    linear_transformation, position_angle_rotation, position_angle_rotation_with_errors, rotate2d,
    rotate3d, RotatedPoints,
};
