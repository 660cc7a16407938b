// tracklet_core/src/utils/angles.rs

use std::f64::consts::{PI, TAU};

/// Wraps an angle into `(-π, π]` in closed form.
///
/// Every difference that contains a heading or bearing component must pass
/// through here before it enters a weighted sum, otherwise a raw `2π` jump
/// corrupts the reconstructed covariance.
pub fn normalize_angle(theta: f64) -> f64 {
    let wrapped = PI - (PI - theta).rem_euclid(TAU);
    // `rem_euclid` can round up to exactly TAU for inputs a hair below a multiple of 2π.
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
