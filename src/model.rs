//! Data models for box recommendation.
//!
//! - `Product`: an order line with dimensions, weight and quantity
//! - `Item`: one physical unit of a product, the thing the packer places
//! - `Container`: a catalog box with interior dimensions and a weight limit

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::validation::{validate_dimensions_3d, validate_weight};
use crate::types::{Dimensional, MAX_ITEMS, Vec3};

/// Validation error for product and container data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid cost: {0}")]
    InvalidCost(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("At least one product is required")]
    EmptyProductList,
    #[error("Too many items: {count} units requested, at most {max} allowed")]
    TooManyItems { count: u64, max: u64 },
}

/// An order line: a product with a quantity.
///
/// # Fields
/// * `name` - Label used for the expanded items
/// * `length`, `width`, `height` - Outer dimensions of one unit
/// * `weight` - Weight of one unit in kg
/// * `quantity` - Number of units, at least 1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Mug",
    "length": 12.0,
    "width": 9.0,
    "height": 10.0,
    "weight": 0.4,
    "quantity": 2
}))]
pub struct Product {
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub weight: f64,
    pub quantity: u32,
}

impl Product {
    /// Creates a validated product.
    ///
    /// # Examples
    /// ```
    /// use box_fit::model::Product;
    ///
    /// assert!(Product::new("Book", (20.0, 14.0, 3.0), 0.5, 2).is_ok());
    /// assert!(Product::new("Book", (20.0, 0.0, 3.0), 0.5, 2).is_err());
    /// assert!(Product::new("Book", (20.0, 14.0, 3.0), 0.5, 0).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let product = Self {
            name: name.into(),
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight,
            quantity,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks the caller contract for a single order line.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimensions_3d(self.dims().as_tuple(), &format!("Product '{}'", self.name))?;
        validate_weight(self.weight, &format!("Product '{}' weight", self.name))?;
        if self.quantity < 1 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Product '{}' quantity must be at least 1",
                self.name
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn dims(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }

    /// Weight of all units of this line.
    pub fn line_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }

    /// Volume of all units of this line.
    pub fn line_volume(&self) -> f64 {
        self.dims().volume() * f64::from(self.quantity)
    }
}

impl Dimensional for Product {
    fn dimensions(&self) -> Vec3 {
        self.dims()
    }
}

/// Validates a whole product list: it must be non-empty, every line valid,
/// and the expanded unit count at most `MAX_ITEMS`.
pub fn validate_products(products: &[Product]) -> Result<(), ValidationError> {
    if products.is_empty() {
        return Err(ValidationError::EmptyProductList);
    }
    products.iter().try_for_each(Product::validate)?;

    let count: u64 = products.iter().map(|p| u64::from(p.quantity)).sum();
    if count > MAX_ITEMS {
        return Err(ValidationError::TooManyItems {
            count,
            max: MAX_ITEMS,
        });
    }
    Ok(())
}

/// A single physical unit to place.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub label: String,
    pub dims: Vec3,
    pub weight: f64,
}

impl Item {
    pub fn new(label: impl Into<String>, dims: Vec3, weight: f64) -> Self {
        Self {
            label: label.into(),
            dims,
            weight,
        }
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// Expands every product into `quantity` independent items.
///
/// Lines with more than one unit get a `"name (k/N)"` label per unit.
pub fn expand_products(products: &[Product]) -> Vec<Item> {
    let capacity = products
        .iter()
        .fold(0usize, |acc, p| acc.saturating_add(p.quantity as usize))
        .min(MAX_ITEMS as usize);
    let mut items = Vec::with_capacity(capacity);
    for product in products {
        for k in 1..=product.quantity {
            let label = if product.quantity > 1 {
                format!("{} ({}/{})", product.name, k, product.quantity)
            } else {
                product.name.clone()
            };
            items.push(Item::new(label, product.dims(), product.weight));
        }
    }
    items
}

fn default_active() -> bool {
    true
}

/// A candidate shipping box from the catalog.
///
/// `length`, `width` and `height` are interior dimensions. A `weight_limit`
/// of 0 means unlimited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "box-m",
    "name": "M",
    "length": 34.0,
    "width": 25.0,
    "height": 21.0,
    "weight_limit": 10.0,
    "cost": 600.0,
    "is_active": true
}))]
pub struct Container {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub weight_limit: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Container {
    /// Creates a validated, active container without an id.
    pub fn new(
        name: impl Into<String>,
        dims: (f64, f64, f64),
        weight_limit: f64,
        cost: f64,
    ) -> Result<Self, ValidationError> {
        let container = Self {
            id: None,
            name: name.into(),
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight_limit,
            cost,
            is_active: true,
        };
        container.validate()?;
        Ok(container)
    }

    /// Checks dimensions, weight limit and cost.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimensions_3d(self.interior().as_tuple(), &format!("Box '{}'", self.name))?;
        validate_weight(self.weight_limit, &format!("Box '{}' weight limit", self.name))?;
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(ValidationError::InvalidCost(format!(
                "Box '{}' cost must be non-negative, got: {}",
                self.name, self.cost
            )));
        }
        Ok(())
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Interior dimensions as a vector.
    #[inline]
    pub fn interior(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }

    /// Nominal interior volume (no padding applied).
    pub fn volume(&self) -> f64 {
        self.interior().volume()
    }

    /// Checks the weight limit. A limit of 0 accepts any weight.
    pub fn accepts_weight(&self, total_weight: f64) -> bool {
        self.weight_limit <= 0.0 || total_weight <= self.weight_limit
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        self.interior()
    }
}
