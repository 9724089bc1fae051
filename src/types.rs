//! Common types and traits for 3D geometry.
//!
//! Axis convention used throughout the crate: `x` is length, `y` is width
//! and `z` is height.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Numerical tolerance for fit and degeneracy comparisons.
///
/// Expressed in the same unit as the dimensions (centimetres in the
/// reference catalog).
pub const EPSILON_FIT: f64 = 1e-3;

/// Upper bound on the number of units in one request, after expanding
/// quantities.
pub const MAX_ITEMS: u64 = 2_000;

/// Represents a 3D vector, used both for points and for extents.
///
/// # Examples
/// ```
/// use box_fit::types::Vec3;
///
/// let dims = Vec3::new(10.0, 20.0, 30.0);
/// assert_eq!(dims.volume(), 6000.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (length)
    /// * `y` - Y component (width)
    /// * `z` - Z component (height)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Creates a vector with the same value on every axis.
    #[inline]
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Product of all components. Meaningful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0
            && self.y > 0.0
            && self.z > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `container` - The outer extents
    /// * `tolerance` - Slack granted on every axis
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }

    /// Shrinks the extents by `padding` on both sides of every axis.
    #[inline]
    pub fn shrink(&self, padding: f64) -> Self {
        *self - Self::splat(padding * 2.0)
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

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

/// Trait for objects with 3D extents.
pub trait Dimensional {
    /// Returns the extents of the object (length, width, height).
    fn dimensions(&self) -> Vec3;

    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks if two boxes share interior volume.
    ///
    /// Boxes that only touch on a face are not considered intersecting.
    /// `tolerance` absorbs floating-point noise at shared faces.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        !(self.max.x <= other.min.x + tolerance
            || other.max.x <= self.min.x + tolerance
            || self.max.y <= other.min.y + tolerance
            || other.max.y <= self.min.y + tolerance
            || self.max.z <= other.min.z + tolerance
            || other.max.z <= self.min.z + tolerance)
    }

    /// Checks if `other` lies completely inside this box.
    #[inline]
    pub fn contains(&self, other: &Self, tolerance: f64) -> bool {
        other.min.x + tolerance >= self.min.x
            && other.min.y + tolerance >= self.min.y
            && other.min.z + tolerance >= self.min.z
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
            && other.max.z <= self.max.z + tolerance
    }

    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Validation functions shared by the model constructors.
pub mod validation {
    use crate::model::ValidationError;

    /// Validates a single dimension.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the dimension for error messages
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
        if value.is_nan() || value.is_infinite() || value <= 0.0 {
            return Err(ValidationError::InvalidDimension(format!(
                "{} must be a positive number, got: {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Validates a weight. Zero is accepted (weightless items, unlimited boxes).
    pub fn validate_weight(value: f64, name: &str) -> Result<(), ValidationError> {
        if value.is_nan() || value.is_infinite() || value < 0.0 {
            return Err(ValidationError::InvalidWeight(format!(
                "{} must be a non-negative number, got: {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Validates all three extents of a 3D object.
    pub fn validate_dimensions_3d(dims: (f64, f64, f64), owner: &str) -> Result<(), ValidationError> {
        validate_dimension(dims.0, &format!("{} length", owner))?;
        validate_dimension(dims.1, &format!("{} width", owner))?;
        validate_dimension(dims.2, &format!("{} height", owner))?;
        Ok(())
    }
}
