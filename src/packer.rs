//! Packing feasibility for a single box.
//!
//! Greedy First-Fit-Decreasing over item volume with a Best-Fit choice of
//! free space and orientation. Free space is kept as a flat list of
//! non-overlapping regions that is split guillotine-style after every
//! placement. There is no backtracking: the first item that cannot be
//! placed makes the whole attempt infeasible.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{BoxFitError, Result};
use crate::geometry::{FreeSpace, orientations};
use crate::model::{Item, ValidationError};
use crate::types::{BoundingBox, Dimensional, EPSILON_FIT, Vec3};

/// Configuration for packing and recommendation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Clearance applied on both sides of every axis
    pub padding: f64,
    /// Tolerance for fit and degeneracy comparisons
    pub epsilon: f64,
    /// Evaluate candidate boxes on the rayon thread pool
    pub parallel: bool,
}

impl PackingConfig {
    pub const DEFAULT_PADDING: f64 = 2.0;
    pub const DEFAULT_EPSILON: f64 = EPSILON_FIT;
    pub const DEFAULT_PARALLEL: bool = true;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            padding: Self::DEFAULT_PADDING,
            epsilon: Self::DEFAULT_EPSILON,
            parallel: Self::DEFAULT_PARALLEL,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn padding(mut self, padding: f64) -> Self {
        self.config.padding = padding;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// An item committed to a position and orientation inside a box.
///
/// `position` is in box coordinates, padding offset included.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacedItem {
    pub label: String,
    #[schema(value_type = [f64; 3], example = json!([2.0, 2.0, 2.0]))]
    #[serde(serialize_with = "serialize_vec3")]
    pub position: Vec3,
    #[schema(value_type = [f64; 3], example = json!([30.0, 20.0, 10.0]))]
    #[serde(serialize_with = "serialize_vec3")]
    pub dims: Vec3,
}

fn serialize_vec3<S>(value: &Vec3, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    value.as_tuple().serialize(serializer)
}

impl PlacedItem {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position, self.dims)
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// Outcome of one packing attempt.
///
/// On failure `placements` holds what was placed before the first
/// unplaceable item and `failed_item` names that item. Callers should rely
/// on `feasible` only.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackResult {
    pub feasible: bool,
    pub placements: Vec<PlacedItem>,
    pub achieved_volume: f64,
    pub failed_item: Option<String>,
}

impl PackResult {
    fn infeasible(
        placements: Vec<PlacedItem>,
        achieved_volume: f64,
        failed_item: Option<String>,
    ) -> Self {
        Self {
            feasible: false,
            placements,
            achieved_volume,
            failed_item,
        }
    }

    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }
}

/// Events emitted while packing, for live progress or diagnostics.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PackEvent {
    ItemPlaced {
        label: String,
        #[schema(value_type = [f64; 3])]
        pos: (f64, f64, f64),
        #[schema(value_type = [f64; 3])]
        dims: (f64, f64, f64),
        waste: f64,
        free_spaces: usize,
    },
    ItemRejected {
        label: String,
        #[schema(value_type = [f64; 3])]
        dims: (f64, f64, f64),
    },
    Finished {
        feasible: bool,
        placed: usize,
        achieved_volume: f64,
    },
}

/// Best candidate found for one item.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    space_idx: usize,
    orientation: Vec3,
    waste: f64,
}

/// Attempts to place every item into a box with the given interior.
///
/// # Parameters
/// * `items` - Individual units to place (quantities already expanded)
/// * `interior` - Nominal interior dimensions of the box
/// * `padding` - Clearance on each side of every axis
///
/// # Returns
/// `Ok(PackResult)` for any geometric outcome; the attempt is infeasible when
/// the padded interior collapses or an item finds no space. `Err` only for
/// caller errors: a non-positive box or item dimension, or invalid padding.
///
/// # Examples
/// ```
/// use box_fit::model::Item;
/// use box_fit::packer::attempt_pack;
/// use box_fit::types::Vec3;
///
/// let items = vec![Item::new("cube", Vec3::new(10.0, 10.0, 10.0), 1.0)];
/// let result = attempt_pack(&items, Vec3::new(14.0, 14.0, 14.0), 2.0).unwrap();
/// assert!(result.feasible);
/// assert_eq!(result.placements[0].position, Vec3::new(2.0, 2.0, 2.0));
/// ```
pub fn attempt_pack(items: &[Item], interior: Vec3, padding: f64) -> Result<PackResult> {
    let config = PackingConfig::builder().padding(padding).build();
    attempt_pack_with_config(items, interior, &config)
}

/// Like `attempt_pack`, with a custom tolerance taken from `config`.
///
/// Every placement decision is logged at trace level.
pub fn attempt_pack_with_config(
    items: &[Item],
    interior: Vec3,
    config: &PackingConfig,
) -> Result<PackResult> {
    attempt_pack_with_progress(items, interior, config, |event| {
        tracing::trace!(?event, "pack progress");
    })
}

/// Packing with a callback invoked for every placement decision.
pub fn attempt_pack_with_progress(
    items: &[Item],
    interior: Vec3,
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackResult> {
    check_inputs(items, interior, config.padding)?;

    let usable = interior.shrink(config.padding);
    if usable.x <= 0.0 || usable.y <= 0.0 || usable.z <= 0.0 {
        tracing::debug!(
            interior = ?interior.as_tuple(),
            padding = config.padding,
            "padded interior collapses, skipping placement"
        );
        on_event(&PackEvent::Finished {
            feasible: false,
            placed: 0,
            achieved_volume: 0.0,
        });
        return Ok(PackResult::infeasible(Vec::new(), 0.0, None));
    }

    // Largest first; equal volumes keep input order (stable sort)
    let mut order: Vec<&Item> = items.iter().collect();
    order.sort_by(|a, b| b.volume().partial_cmp(&a.volume()).unwrap_or(Ordering::Equal));

    let offset = Vec3::splat(config.padding);
    let mut free_spaces = vec![FreeSpace::new(Vec3::zero(), usable)];
    let mut placements: Vec<PlacedItem> = Vec::with_capacity(items.len());
    let mut achieved_volume = 0.0;

    for item in order {
        let Some(best) = find_best_fit(item, &free_spaces, config.epsilon) else {
            tracing::debug!(item = %item.label, placed = placements.len(), "no free space fits item");
            on_event(&PackEvent::ItemRejected {
                label: item.label.clone(),
                dims: item.dims.as_tuple(),
            });
            on_event(&PackEvent::Finished {
                feasible: false,
                placed: placements.len(),
                achieved_volume,
            });
            return Ok(PackResult::infeasible(
                placements,
                achieved_volume,
                Some(item.label.clone()),
            ));
        };

        let space = free_spaces[best.space_idx];
        let placed = PlacedItem {
            label: item.label.clone(),
            position: space.origin + offset,
            dims: best.orientation,
        };
        achieved_volume += best.orientation.volume();

        let children = space.split(&best.orientation, config.epsilon);
        free_spaces.splice(best.space_idx..=best.space_idx, children);
        // Smallest regions first so later scans prefer tight spots
        free_spaces.sort_by(|a, b| a.volume().partial_cmp(&b.volume()).unwrap_or(Ordering::Equal));

        on_event(&PackEvent::ItemPlaced {
            label: placed.label.clone(),
            pos: placed.position.as_tuple(),
            dims: placed.dims.as_tuple(),
            waste: best.waste,
            free_spaces: free_spaces.len(),
        });
        placements.push(placed);
    }

    on_event(&PackEvent::Finished {
        feasible: true,
        placed: placements.len(),
        achieved_volume,
    });
    Ok(PackResult {
        feasible: true,
        placements,
        achieved_volume,
        failed_item: None,
    })
}

fn check_inputs(items: &[Item], interior: Vec3, padding: f64) -> Result<()> {
    if !interior.is_valid_dimension() {
        return Err(BoxFitError::DegenerateContainer {
            length: interior.x,
            width: interior.y,
            height: interior.z,
        });
    }
    BoxFitError::check_padding(padding)?;
    if let Some(item) = items.iter().find(|item| !item.dims.is_valid_dimension()) {
        return Err(ValidationError::InvalidDimension(format!(
            "Item '{}' has a non-positive dimension: {:?}",
            item.label,
            item.dims.as_tuple()
        ))
        .into());
    }
    Ok(())
}

/// Scans every (free space, orientation) pair for the least wasted volume.
///
/// Ties keep the first pair found: free-space list order, then orientation
/// order.
fn find_best_fit(item: &Item, free_spaces: &[FreeSpace], epsilon: f64) -> Option<Candidate> {
    let candidates = orientations(item.dims);
    let mut best: Option<Candidate> = None;

    for (space_idx, space) in free_spaces.iter().enumerate() {
        let space_volume = space.volume();
        for orientation in &candidates {
            if !space.fits(orientation, epsilon) {
                continue;
            }
            let waste = space_volume - orientation.volume();
            if best.is_none_or(|current| waste < current.waste) {
                best = Some(Candidate {
                    space_idx,
                    orientation: *orientation,
                    waste,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{find_overlap, within_padded_interior};

    fn cube(label: &str, side: f64) -> Item {
        Item::new(label, Vec3::splat(side), 1.0)
    }

    fn assert_sound(result: &PackResult, items: &[Item], interior: Vec3, padding: f64) {
        assert!(result.feasible);
        assert_eq!(result.placements.len(), items.len());
        assert_eq!(find_overlap(&result.placements, EPSILON_FIT), None);
        for placed in &result.placements {
            assert!(
                within_padded_interior(placed, interior, padding, EPSILON_FIT),
                "{} leaves the padded interior",
                placed.label
            );
        }
        let placed_volume: f64 = result.placements.iter().map(|p| p.dims.volume()).sum();
        let item_volume: f64 = items.iter().map(|i| i.dims.volume()).sum();
        assert!((result.achieved_volume - placed_volume).abs() < 1e-9);
        assert!((result.achieved_volume - item_volume).abs() < 1e-9);
    }

    #[test]
    fn single_item_in_larger_box() {
        let items = vec![cube("a", 10.0)];
        let result = attempt_pack(&items, Vec3::splat(20.0), 0.0).unwrap();

        assert_sound(&result, &items, Vec3::splat(20.0), 0.0);
        assert_eq!(result.placements[0].position, Vec3::zero());
        assert!((result.achieved_volume - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn padding_offsets_positions_and_allows_exact_fit() {
        let items = vec![cube("a", 10.0)];
        let result = attempt_pack(&items, Vec3::splat(14.0), 2.0).unwrap();

        assert_sound(&result, &items, Vec3::splat(14.0), 2.0);
        assert_eq!(result.placements[0].position, Vec3::splat(2.0));
    }

    #[test]
    fn cube_larger_than_box_is_infeasible() {
        let items = vec![cube("big", 10.0)];
        let result = attempt_pack(&items, Vec3::splat(9.0), 0.0).unwrap();

        assert!(!result.feasible);
        assert!(result.placements.is_empty());
        assert_eq!(result.failed_item.as_deref(), Some("big"));
    }

    #[test]
    fn two_halves_stack_into_exact_cube() {
        let items = vec![
            Item::new("half (1/2)", Vec3::new(10.0, 10.0, 5.0), 1.0),
            Item::new("half (2/2)", Vec3::new(10.0, 10.0, 5.0), 1.0),
        ];
        let result = attempt_pack(&items, Vec3::splat(10.0), 0.0).unwrap();

        assert_sound(&result, &items, Vec3::splat(10.0), 0.0);
        assert_eq!(result.placements[0].label, "half (1/2)");
        assert_eq!(result.placements[0].position, Vec3::zero());
        assert_eq!(result.placements[0].dims, Vec3::new(10.0, 10.0, 5.0));
        assert_eq!(result.placements[1].position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(result.placements[1].dims, Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn collapsed_interior_fails_fast() {
        let items = vec![cube("a", 1.0)];
        let result = attempt_pack(&items, Vec3::new(4.0, 10.0, 10.0), 2.0).unwrap();

        assert!(!result.feasible);
        assert!(result.placements.is_empty());
        assert_eq!(result.failed_item, None);
        assert_eq!(result.achieved_volume, 0.0);
    }

    #[test]
    fn degenerate_input_is_a_caller_error() {
        let items = vec![cube("a", 1.0)];
        assert!(matches!(
            attempt_pack(&items, Vec3::new(0.0, 10.0, 10.0), 0.0),
            Err(BoxFitError::DegenerateContainer { .. })
        ));
        assert!(matches!(
            attempt_pack(&items, Vec3::splat(10.0), -1.0),
            Err(BoxFitError::InvalidPadding(_))
        ));

        let flat = vec![Item::new("flat", Vec3::new(1.0, 1.0, 0.0), 1.0)];
        assert!(matches!(
            attempt_pack(&flat, Vec3::splat(10.0), 0.0),
            Err(BoxFitError::Validation(ValidationError::InvalidDimension(_)))
        ));
    }

    #[test]
    fn rotation_is_used_when_needed() {
        let items = vec![Item::new("rod", Vec3::new(2.0, 2.0, 30.0), 1.0)];
        let result = attempt_pack(&items, Vec3::new(30.0, 5.0, 5.0), 0.0).unwrap();

        assert_sound(&result, &items, Vec3::new(30.0, 5.0, 5.0), 0.0);
        assert_eq!(result.placements[0].dims, Vec3::new(30.0, 2.0, 2.0));
    }

    #[test]
    fn larger_items_are_placed_first() {
        let items = vec![
            Item::new("small", Vec3::new(2.0, 2.0, 2.0), 0.1),
            Item::new("large", Vec3::new(8.0, 8.0, 8.0), 2.0),
            Item::new("medium", Vec3::new(4.0, 4.0, 4.0), 0.5),
        ];
        let result = attempt_pack(&items, Vec3::splat(12.0), 0.0).unwrap();

        let labels: Vec<_> = result.placements.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["large", "medium", "small"]);
        assert_sound(&result, &items, Vec3::splat(12.0), 0.0);
    }

    #[test]
    fn equal_volumes_keep_input_order() {
        let items = vec![
            Item::new("first", Vec3::new(1.0, 2.0, 3.0), 0.0),
            Item::new("second", Vec3::new(3.0, 2.0, 1.0), 0.0),
            Item::new("third", Vec3::new(6.0, 1.0, 1.0), 0.0),
        ];
        let result = attempt_pack(&items, Vec3::splat(10.0), 0.0).unwrap();

        let labels: Vec<_> = result.placements.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn failure_keeps_partial_placements_for_diagnostics() {
        let items = vec![
            Item::new("fits", Vec3::new(10.0, 10.0, 8.0), 1.0),
            Item::new("too tall", Vec3::new(10.0, 10.0, 5.0), 1.0),
        ];
        let result = attempt_pack(&items, Vec3::splat(10.0), 0.0).unwrap();

        assert!(!result.feasible);
        assert_eq!(result.placed_count(), 1);
        assert_eq!(result.placements[0].label, "fits");
        assert_eq!(result.failed_item.as_deref(), Some("too tall"));
        assert!((result.achieved_volume - 800.0).abs() < 1e-9);
    }

    #[test]
    fn best_fit_prefers_tightest_space() {
        // After the base: front region 10x2x10 (200) and top region 10x10x4 (400).
        // The slab wastes 120 in front and 320 on top.
        let items = vec![
            Item::new("base", Vec3::new(10.0, 10.0, 6.0), 1.0),
            Item::new("slab", Vec3::new(10.0, 2.0, 4.0), 1.0),
        ];
        let interior = Vec3::new(10.0, 12.0, 10.0);
        let result = attempt_pack(&items, interior, 0.0).unwrap();

        assert_sound(&result, &items, interior, 0.0);
        let slab = &result.placements[1];
        assert_eq!(slab.position.y, 10.0);
        assert_eq!(slab.position.z, 0.0);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let items: Vec<Item> = (0..12)
            .map(|i| {
                let f = f64::from(i);
                Item::new(
                    format!("item-{}", i),
                    Vec3::new(3.0 + f % 4.0, 2.0 + f % 3.0, 1.0 + f % 5.0),
                    0.5,
                )
            })
            .collect();
        let interior = Vec3::new(30.0, 25.0, 20.0);

        let first = attempt_pack(&items, interior, 1.5).unwrap();
        let second = attempt_pack(&items, interior, 1.5).unwrap();
        assert_eq!(first, second);
        assert_sound(&first, &items, interior, 1.5);
    }

    #[test]
    fn mixed_order_packs_without_overlap() {
        let dims = [
            (12.0, 9.0, 10.0),
            (20.0, 14.0, 3.0),
            (8.0, 8.0, 8.0),
            (25.0, 25.0, 2.0),
            (5.0, 5.0, 15.0),
            (9.5, 7.25, 3.125),
        ];
        let items: Vec<Item> = dims
            .iter()
            .enumerate()
            .flat_map(|(i, d)| {
                (0..3).map(move |k| Item::new(format!("p{}-{}", i, k), Vec3::from_tuple(*d), 0.3))
            })
            .collect();
        let interior = Vec3::new(55.0, 45.0, 40.0);

        let result = attempt_pack(&items, interior, 2.0).unwrap();
        assert_sound(&result, &items, interior, 2.0);
    }

    #[test]
    fn progress_events_follow_placements() {
        let items = vec![cube("a", 5.0), cube("b", 5.0), cube("c", 20.0)];
        let mut events = Vec::new();
        let result = attempt_pack_with_progress(
            &items,
            Vec3::splat(10.0),
            &PackingConfig::builder().padding(0.0).build(),
            |evt| events.push(evt.clone()),
        )
        .unwrap();

        assert!(!result.feasible);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], PackEvent::ItemRejected { label, .. } if label == "c"));
        assert!(matches!(
            events[1],
            PackEvent::Finished {
                feasible: false,
                placed: 0,
                ..
            }
        ));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = PackingConfig::builder()
            .padding(0.5)
            .epsilon(1e-4)
            .parallel(false)
            .build();
        assert_eq!(config.padding, 0.5);
        assert_eq!(config.epsilon, 1e-4);
        assert!(!config.parallel);

        let defaults = PackingConfig::default();
        assert_eq!(defaults.padding, PackingConfig::DEFAULT_PADDING);
        assert_eq!(defaults.epsilon, EPSILON_FIT);
    }
}
