//! Container catalog sources.
//!
//! The recommender only ever sees a slice of `Container`s. This module
//! produces that slice for the service: either from a JSON file or from the
//! built-in reference catalog.

use std::fs;
use std::path::Path;

use crate::error::{BoxFitError, Result};
use crate::model::Container;

/// Reference boxes: (id, name, length, width, height, weight limit, cost).
const REFERENCE_BOXES: [(&str, &str, f64, f64, f64, f64, f64); 8] = [
    ("box-s", "S", 22.0, 19.0, 9.0, 2.0, 300.0),
    ("box-sm", "SM", 27.0, 22.0, 15.0, 5.0, 450.0),
    ("box-m", "M", 34.0, 25.0, 21.0, 10.0, 600.0),
    ("box-ml", "ML", 41.0, 31.0, 28.0, 15.0, 800.0),
    ("box-l", "L", 48.0, 38.0, 34.0, 20.0, 1000.0),
    ("box-xl", "XL", 55.0, 45.0, 40.0, 25.0, 1300.0),
    ("box-xxl", "XXL", 65.0, 50.0, 45.0, 30.0, 1600.0),
    ("box-flat", "FLAT", 40.0, 30.0, 10.0, 5.0, 400.0),
];

/// The catalog used when no catalog file is configured.
pub fn reference_catalog() -> Vec<Container> {
    REFERENCE_BOXES
        .iter()
        .map(|&(id, name, length, width, height, weight_limit, cost)| Container {
            id: Some(id.to_string()),
            name: name.to_string(),
            length,
            width,
            height,
            weight_limit,
            cost,
            is_active: true,
        })
        .collect()
}

/// Parses a JSON array of containers and validates every entry.
pub fn parse_catalog(raw: &str) -> Result<Vec<Container>> {
    let containers: Vec<Container> = serde_json::from_str(raw)?;
    for (idx, container) in containers.iter().enumerate() {
        container
            .validate()
            .map_err(|err| BoxFitError::Catalog(format!("entry {}: {}", idx, err)))?;
    }
    Ok(containers)
}

/// Reads and validates a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Container>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let containers = parse_catalog(&raw)?;
    tracing::info!(
        path = %path.display(),
        boxes = containers.len(),
        active = containers.iter().filter(|c| c.is_active).count(),
        "catalog loaded"
    );
    Ok(containers)
}
