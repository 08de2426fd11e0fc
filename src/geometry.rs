//! Geometric predicates for placing boxes inside bins.
//!
//! The overlap test works on axis pairs: two boxes collide only when their
//! projections onto the (width, height), (height, depth) and (width, depth)
//! planes all overlap by more than a fixed absolute tolerance.

use crate::types::{Axis, BoundingBox, Dimension, Pivot};

/// Checks whether the projections of `a` and `b` onto the `x`/`y` plane overlap.
///
/// The projections overlap when, on both axes, half the summed extents exceed
/// the distance between the centers by more than `tolerance`. Touching faces
/// (or faces that interpenetrate by at most `tolerance`) do not count.
///
/// # Parameters
/// * `a` - First placed box
/// * `b` - Second placed box
/// * `x` - First axis of the projection plane
/// * `y` - Second axis of the projection plane
/// * `tolerance` - Absolute slack absorbing floating-point error
pub fn rect_intersect(
    a: &BoundingBox,
    b: &BoundingBox,
    x: Axis,
    y: Axis,
    tolerance: f64,
) -> bool {
    let (da, db) = (a.dimensions(), b.dimensions());
    let (ca, cb) = (a.center(), b.center());

    let ix = (ca.component(x) - cb.component(x)).abs();
    let iy = (ca.component(y) - cb.component(y)).abs();

    (da.component(x) + db.component(x)) / 2.0 - ix > tolerance
        && (da.component(y) + db.component(y)) / 2.0 - iy > tolerance
}

/// Checks whether two placed boxes intersect.
///
/// # Examples
/// ```
/// use bin_packer_3d::geometry::intersects;
/// use bin_packer_3d::types::{BoundingBox, Vec3, OVERLAP_TOLERANCE};
///
/// let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
/// let b = BoundingBox::from_position_and_dims(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
/// assert!(!intersects(&a, &b, OVERLAP_TOLERANCE));
/// assert!(intersects(&a, &a, OVERLAP_TOLERANCE));
/// ```
pub fn intersects(a: &BoundingBox, b: &BoundingBox, tolerance: f64) -> bool {
    rect_intersect(a, b, Axis::Width, Axis::Height, tolerance)
        && rect_intersect(a, b, Axis::Height, Axis::Depth, tolerance)
        && rect_intersect(a, b, Axis::Width, Axis::Depth, tolerance)
}

/// Checks whether an extent placed at `pivot` stays inside `bounds`.
///
/// The comparison is exact: `bounds.x >= pivot.x + extent.x`, and likewise
/// for y and z.
pub fn fits_within_bounds(pivot: Pivot, extent: Dimension, bounds: Dimension) -> bool {
    bounds.x >= pivot.x + extent.x
        && bounds.y >= pivot.y + extent.y
        && bounds.z >= pivot.z + extent.z
}
