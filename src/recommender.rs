//! Box recommendation over a catalog.
//!
//! Every active box gets exactly one all-or-nothing packing attempt. Boxes
//! that fit are ranked by space utilization, tightest first.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{BoxFitError, Result};
use crate::model::{Container, Item, Product, expand_products, validate_products};
use crate::packer::{PackingConfig, PlacedItem, attempt_pack_with_config};

/// One feasible box with its packing.
///
/// # Fields
/// * `utilization` - Packed item volume over the padded usable volume, in (0, 1].
///   Items may exceed their space by the fit tolerance, so the ratio is capped at 1
/// * `container_volume` - Nominal interior volume of the box
/// * `usable_volume` - Interior volume left after padding
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Recommendation {
    #[serde(rename = "box")]
    pub container: Container,
    pub utilization: f64,
    pub total_item_volume: f64,
    pub total_weight: f64,
    pub container_volume: f64,
    pub usable_volume: f64,
    pub placements: Vec<PlacedItem>,
}

/// Sum of `weight × quantity` over all order lines.
pub fn total_weight(products: &[Product]) -> f64 {
    products.iter().map(Product::line_weight).sum()
}

/// Sum of `length × width × height × quantity` over all order lines.
pub fn total_volume(products: &[Product]) -> f64 {
    products.iter().map(Product::line_volume).sum()
}

/// Recommends boxes for the products, best first.
///
/// # Parameters
/// * `products` - Order lines, validated here (non-empty, positive dimensions, quantity >= 1)
/// * `catalog` - Candidate boxes; inactive ones are ignored
/// * `padding` - Clearance on each side of every axis
///
/// # Returns
/// Feasible boxes sorted by decreasing utilization. Ties keep the smaller
/// box first. An empty list means no box fits.
///
/// # Examples
/// ```
/// use box_fit::model::{Container, Product};
/// use box_fit::recommender::recommend;
///
/// let products = vec![Product::new("Cube", (10.0, 10.0, 10.0), 1.0, 1).unwrap()];
/// let catalog = vec![Container::new("Box", (20.0, 20.0, 20.0), 0.0, 1.0).unwrap()];
///
/// let ranked = recommend(&products, &catalog, 0.0).unwrap();
/// assert_eq!(ranked.len(), 1);
/// assert!((ranked[0].utilization - 0.125).abs() < 1e-9);
/// ```
pub fn recommend(
    products: &[Product],
    catalog: &[Container],
    padding: f64,
) -> Result<Vec<Recommendation>> {
    let config = PackingConfig::builder().padding(padding).build();
    recommend_with_config(products, catalog, &config)
}

/// Like `recommend`, with tolerance and parallelism taken from `config`.
pub fn recommend_with_config(
    products: &[Product],
    catalog: &[Container],
    config: &PackingConfig,
) -> Result<Vec<Recommendation>> {
    validate_products(products)?;
    BoxFitError::check_padding(config.padding)?;

    let weight = total_weight(products);
    let volume = total_volume(products);

    let mut candidates: Vec<&Container> = catalog.iter().filter(|c| c.is_active).collect();
    candidates.sort_by(|a, b| a.volume().partial_cmp(&b.volume()).unwrap_or(Ordering::Equal));

    let items = expand_products(products);
    let evaluate = |container: &&Container| evaluate_candidate(container, &items, weight, volume, config);

    let mut results: Vec<Recommendation> = if config.parallel {
        candidates.par_iter().filter_map(evaluate).collect()
    } else {
        candidates.iter().filter_map(evaluate).collect()
    };

    results.sort_by(|a, b| {
        b.utilization
            .partial_cmp(&a.utilization)
            .unwrap_or(Ordering::Equal)
    });

    tracing::info!(
        items = items.len(),
        candidates = candidates.len(),
        feasible = results.len(),
        best = results.first().map(|r| r.container.name.as_str()),
        "recommendation finished"
    );

    Ok(results)
}

/// Weight check and one packing attempt for a single box.
fn evaluate_candidate(
    container: &Container,
    items: &[Item],
    total_weight: f64,
    total_item_volume: f64,
    config: &PackingConfig,
) -> Option<Recommendation> {
    if !container.accepts_weight(total_weight) {
        tracing::debug!(
            container = %container.name,
            weight_limit = container.weight_limit,
            total_weight,
            "skipping box: weight limit exceeded"
        );
        return None;
    }

    let pack = match attempt_pack_with_config(items, container.interior(), config) {
        Ok(pack) => pack,
        Err(err) => {
            tracing::warn!(container = %container.name, error = %err, "skipping box");
            return None;
        }
    };

    if !pack.feasible {
        tracing::debug!(
            container = %container.name,
            placed = pack.placed_count(),
            failed_item = pack.failed_item.as_deref(),
            "items do not fit"
        );
        return None;
    }

    let usable_volume = container.interior().shrink(config.padding).volume();
    let utilization = (pack.achieved_volume / usable_volume).min(1.0);
    tracing::debug!(container = %container.name, utilization, "items fit");

    Some(Recommendation {
        container: container.clone(),
        utilization,
        total_item_volume,
        total_weight,
        container_volume: container.volume(),
        usable_volume,
        placements: pack.placements,
    })
}
