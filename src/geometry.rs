//! Geometric helpers for the packer: orientation enumeration, free-space
//! regions and their guillotine split, plus overlap checks on placements.

use serde::Serialize;

use crate::packer::PlacedItem;
use crate::types::{BoundingBox, Vec3};

/// Enumerates the axis-aligned orientations of a box.
///
/// Permutations are generated in the fixed order
/// `(l,w,h) (l,h,w) (w,l,h) (w,h,l) (h,l,w) (h,w,l)`. Duplicates by value are
/// dropped, keeping the first occurrence, so a cube yields one orientation
/// and a box with two equal sides yields three.
///
/// # Examples
/// ```
/// use box_fit::geometry::orientations;
/// use box_fit::types::Vec3;
///
/// assert_eq!(orientations(Vec3::new(10.0, 10.0, 10.0)).len(), 1);
/// assert_eq!(orientations(Vec3::new(10.0, 10.0, 5.0)).len(), 3);
/// assert_eq!(orientations(Vec3::new(1.0, 2.0, 3.0)).len(), 6);
/// ```
pub fn orientations(dims: Vec3) -> Vec<Vec3> {
    let Vec3 { x: l, y: w, z: h } = dims;
    let permutations = [
        Vec3::new(l, w, h),
        Vec3::new(l, h, w),
        Vec3::new(w, l, h),
        Vec3::new(w, h, l),
        Vec3::new(h, l, w),
        Vec3::new(h, w, l),
    ];

    let mut unique: Vec<Vec3> = Vec::with_capacity(permutations.len());
    for candidate in permutations {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

/// An empty axis-aligned region of the usable interior.
///
/// Coordinates are relative to the padded interior, i.e. the padding offset
/// is not included.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FreeSpace {
    pub origin: Vec3,
    pub size: Vec3,
}

impl FreeSpace {
    #[inline]
    pub const fn new(origin: Vec3, size: Vec3) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.size.volume()
    }

    /// Checks if extents `dims` fit into this region as given.
    #[inline]
    pub fn fits(&self, dims: &Vec3, epsilon: f64) -> bool {
        dims.fits_within(&self.size, epsilon)
    }

    /// Splits the region after `placed` was put at its origin.
    ///
    /// Produces up to three children, in this order:
    /// - right: beyond the item on the length axis, full width and height
    /// - front: beyond the item on the width axis, within the item's length
    /// - top: above the item, within the item's footprint
    ///
    /// Children whose remaining extent is not above `epsilon` are dropped.
    pub fn split(&self, placed: &Vec3, epsilon: f64) -> Vec<FreeSpace> {
        let mut children = Vec::with_capacity(3);

        let right_length = self.size.x - placed.x;
        if right_length > epsilon {
            children.push(FreeSpace::new(
                Vec3::new(self.origin.x + placed.x, self.origin.y, self.origin.z),
                Vec3::new(right_length, self.size.y, self.size.z),
            ));
        }

        let front_width = self.size.y - placed.y;
        if front_width > epsilon {
            children.push(FreeSpace::new(
                Vec3::new(self.origin.x, self.origin.y + placed.y, self.origin.z),
                Vec3::new(placed.x, front_width, self.size.z),
            ));
        }

        let top_height = self.size.z - placed.z;
        if top_height > epsilon {
            children.push(FreeSpace::new(
                Vec3::new(self.origin.x, self.origin.y, self.origin.z + placed.z),
                Vec3::new(placed.x, placed.y, top_height),
            ));
        }

        children
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.origin, self.size)
    }
}

/// Checks whether two placements share interior volume.
///
/// Face contact is not an intersection.
pub fn intersects(a: &PlacedItem, b: &PlacedItem, epsilon: f64) -> bool {
    a.bounding_box().intersects(&b.bounding_box(), epsilon)
}

/// Checks that a placement lies inside the padded interior of a box.
///
/// # Parameters
/// * `placed` - The placement, in box coordinates (padding offset included)
/// * `interior` - Nominal interior dimensions of the box
/// * `padding` - Clearance on each side of every axis
pub fn within_padded_interior(
    placed: &PlacedItem,
    interior: Vec3,
    padding: f64,
    epsilon: f64,
) -> bool {
    let usable =
        BoundingBox::from_position_and_dims(Vec3::splat(padding), interior.shrink(padding));
    usable.contains(&placed.bounding_box(), epsilon)
}

/// Finds the first pair of overlapping placements, if any.
pub fn find_overlap(placements: &[PlacedItem], epsilon: f64) -> Option<(usize, usize)> {
    for (i, a) in placements.iter().enumerate() {
        for (j, b) in placements.iter().enumerate().skip(i + 1) {
            if intersects(a, b, epsilon) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_FIT;

    fn placed(label: &str, pos: (f64, f64, f64), dims: (f64, f64, f64)) -> PlacedItem {
        PlacedItem {
            label: label.to_string(),
            position: pos.into(),
            dims: dims.into(),
        }
    }

    #[test]
    fn orientation_order_is_fixed() {
        let result = orientations(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            result,
            vec![
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(1.0, 3.0, 2.0),
                Vec3::new(2.0, 1.0, 3.0),
                Vec3::new(2.0, 3.0, 1.0),
                Vec3::new(3.0, 1.0, 2.0),
                Vec3::new(3.0, 2.0, 1.0),
            ]
        );
    }

    #[test]
    fn orientation_duplicates_removed_by_value() {
        let result = orientations(Vec3::new(10.0, 10.0, 5.0));
        assert_eq!(
            result,
            vec![
                Vec3::new(10.0, 10.0, 5.0),
                Vec3::new(10.0, 5.0, 10.0),
                Vec3::new(5.0, 10.0, 10.0),
            ]
        );
    }

    #[test]
    fn split_produces_right_front_top() {
        let space = FreeSpace::new(Vec3::zero(), Vec3::new(10.0, 8.0, 6.0));
        let children = space.split(&Vec3::new(4.0, 3.0, 2.0), EPSILON_FIT);

        assert_eq!(
            children,
            vec![
                FreeSpace::new(Vec3::new(4.0, 0.0, 0.0), Vec3::new(6.0, 8.0, 6.0)),
                FreeSpace::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(4.0, 5.0, 6.0)),
                FreeSpace::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(4.0, 3.0, 4.0)),
            ]
        );
    }

    #[test]
    fn split_conserves_volume_and_does_not_overlap() {
        let space = FreeSpace::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 8.0, 6.0));
        let item = Vec3::new(4.0, 3.0, 2.0);
        let children = space.split(&item, EPSILON_FIT);

        let total: f64 = children.iter().map(FreeSpace::volume).sum::<f64>() + item.volume();
        assert!((total - space.volume()).abs() < 1e-9);

        let item_box = BoundingBox::from_position_and_dims(space.origin, item);
        for (i, a) in children.iter().enumerate() {
            assert!(space.bounding_box().contains(&a.bounding_box(), EPSILON_FIT));
            assert!(!a.bounding_box().intersects(&item_box, EPSILON_FIT));
            for b in children.iter().skip(i + 1) {
                assert!(!a.bounding_box().intersects(&b.bounding_box(), EPSILON_FIT));
            }
        }
    }

    #[test]
    fn split_drops_degenerate_children() {
        let space = FreeSpace::new(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        assert!(space.split(&Vec3::new(10.0, 10.0, 10.0), EPSILON_FIT).is_empty());

        let children = space.split(&Vec3::new(10.0, 10.0, 5.0), EPSILON_FIT);
        assert_eq!(
            children,
            vec![FreeSpace::new(
                Vec3::new(0.0, 0.0, 5.0),
                Vec3::new(10.0, 10.0, 5.0)
            )]
        );

        // Residual thinner than the tolerance is noise, not space
        let children = space.split(&Vec3::new(9.9995, 10.0, 10.0), EPSILON_FIT);
        assert!(children.is_empty());
    }

    #[test]
    fn fits_uses_tolerance() {
        let space = FreeSpace::new(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        assert!(space.fits(&Vec3::new(10.0005, 10.0, 10.0), EPSILON_FIT));
        assert!(!space.fits(&Vec3::new(10.01, 10.0, 10.0), EPSILON_FIT));
    }

    #[test]
    fn overlap_detection() {
        let a = placed("a", (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = placed("b", (10.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let c = placed("c", (5.0, 5.0, 5.0), (10.0, 10.0, 10.0));

        assert!(!intersects(&a, &b, EPSILON_FIT));
        assert!(intersects(&a, &c, EPSILON_FIT));
        assert_eq!(find_overlap(&[a.clone(), b.clone()], EPSILON_FIT), None);
        assert_eq!(find_overlap(&[a, b, c], EPSILON_FIT), Some((0, 2)));
    }

    #[test]
    fn padded_interior_bounds() {
        let inside = placed("in", (2.0, 2.0, 2.0), (10.0, 10.0, 10.0));
        let touching_wall = placed("wall", (0.0, 2.0, 2.0), (10.0, 10.0, 10.0));
        let interior = Vec3::new(14.0, 14.0, 14.0);

        assert!(within_padded_interior(&inside, interior, 2.0, EPSILON_FIT));
        assert!(!within_padded_interior(&touching_wall, interior, 2.0, EPSILON_FIT));
    }
}
