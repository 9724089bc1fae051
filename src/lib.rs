//! Box recommendation for e-commerce shipments.
//!
//! Given the products of an order and a catalog of shipping boxes, the
//! recommender packs the products into every active box with a
//! first-fit-decreasing, best-fit guillotine heuristic and ranks the boxes
//! that hold everything by volume utilization.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod recommender;
pub mod types;
