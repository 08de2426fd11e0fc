//! Common types and traits for 3D geometry.
//!
//! This module defines the value types shared by the whole packing engine:
//! the `Vec3` triple (used both as a placement pivot and as an extent),
//! the three spatial axes and the six axis-aligned item rotations.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Absolute tolerance used by the overlap test.
///
/// Two placed items whose projections overlap by no more than this amount on
/// an axis are treated as touching, not overlapping. The value is in the same
/// units as the input dimensions.
pub const OVERLAP_TOLERANCE: f64 = 0.01;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```
/// use bin_packer_3d::types::Vec3;
///
/// let pivot = Vec3::new(1.0, 2.0, 3.0);
/// let extent = Vec3::new(10.0, 20.0, 30.0);
/// let far_corner = pivot + extent;
/// assert_eq!(far_corner, Vec3::new(11.0, 22.0, 33.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Minimum corner of a placed item, in the bin's local frame.
pub type Pivot = Vec3;

/// Extent of an item along the x, y and z axes.
pub type Dimension = Vec3;

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (width axis)
    /// * `y` - Y component (height axis)
    /// * `z` - Z component (depth axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Returns the component along `axis`.
    #[inline]
    pub const fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Width => self.x,
            Axis::Height => self.y,
            Axis::Depth => self.z,
        }
    }

    /// Returns a copy with the component along `axis` increased by `delta`.
    #[inline]
    pub fn offset_along(self, axis: Axis, delta: f64) -> Self {
        match axis {
            Axis::Width => Self::new(self.x + delta, self.y, self.z),
            Axis::Height => Self::new(self.x, self.y + delta, self.z),
            Axis::Depth => Self::new(self.x, self.y, self.z + delta),
        }
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `container` - The outer vector (e.g., bin dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// One of the three spatial axes of a bin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
    Depth,
}

impl Axis {
    /// All axes in pivot-generation order.
    pub const ALL: [Axis; 3] = [Axis::Width, Axis::Height, Axis::Depth];
}

/// Axis-aligned orientation of an item.
///
/// The letters name which intrinsic measure (width, height, depth) ends up on
/// the x, y and z axes respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rotation {
    Whd,
    Hwd,
    Hdw,
    Dhw,
    Dwh,
    Wdh,
}

impl Rotation {
    /// All rotations in the order the placement search tries them.
    pub const ALL: [Rotation; 6] = [
        Rotation::Whd,
        Rotation::Hwd,
        Rotation::Hdw,
        Rotation::Dhw,
        Rotation::Dwh,
        Rotation::Wdh,
    ];

    /// Maps intrinsic `(width, height, depth)` onto the placed `(x, y, z)` extent.
    ///
    /// # Examples
    /// ```
    /// use bin_packer_3d::types::{Rotation, Vec3};
    ///
    /// let extent = Rotation::Hdw.apply(1.0, 2.0, 3.0);
    /// assert_eq!(extent, Vec3::new(2.0, 3.0, 1.0));
    /// ```
    #[inline]
    pub const fn apply(self, w: f64, h: f64, d: f64) -> Dimension {
        match self {
            Rotation::Whd => Vec3::new(w, h, d),
            Rotation::Hwd => Vec3::new(h, w, d),
            Rotation::Hdw => Vec3::new(h, d, w),
            Rotation::Dhw => Vec3::new(d, h, w),
            Rotation::Dwh => Vec3::new(d, w, h),
            Rotation::Wdh => Vec3::new(w, d, h),
        }
    }

    /// Short code used in API responses.
    pub const fn code(self) -> &'static str {
        match self {
            Rotation::Whd => "WHD",
            Rotation::Hwd => "HWD",
            Rotation::Hdw => "HDW",
            Rotation::Dhw => "DHW",
            Rotation::Dwh => "DWH",
            Rotation::Wdh => "WDH",
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axes = match self {
            Rotation::Whd => "(w,h,d)",
            Rotation::Hwd => "(h,w,d)",
            Rotation::Hdw => "(h,d,w)",
            Rotation::Dhw => "(d,h,w)",
            Rotation::Dwh => "(d,w,h)",
            Rotation::Wdh => "(w,d,h)",
        };
        write!(f, "RotationType_{} {}", self.code(), axes)
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight.
    fn weight(&self) -> f64;
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (pivot)
    pub min: Vec3,
    /// Maximum corner (pivot + extent)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and dimensions.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks whether `other` lies entirely inside this box.
    #[inline]
    pub fn contains_box(&self, other: &Self, tolerance: f64) -> bool {
        other.min.x + tolerance >= self.min.x
            && other.min.y + tolerance >= self.min.y
            && other.min.z + tolerance >= self.min.z
            && other.max.fits_within(&self.max, tolerance)
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extent of the box.
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Validation helpers shared by items and bins.
pub mod validation {
    use crate::error::ValidationError;

    /// Validates a single dimension.
    ///
    /// Zero is accepted; negative, NaN and infinite values are not.
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidDimension(format!(
                "{} must be a non-negative finite number, got: {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Validates a weight or weight capacity.
    pub fn validate_weight(value: f64, name: &str) -> Result<(), ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidWeight(format!(
                "{} must be a non-negative finite number, got: {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Validates all three dimensions of a 3D object.
    pub fn validate_dimensions_3d(dims: (f64, f64, f64)) -> Result<(), ValidationError> {
        validate_dimension(dims.0, "Width")?;
        validate_dimension(dims.1, "Height")?;
        validate_dimension(dims.2, "Depth")?;
        Ok(())
    }
}
