//! Inventory valuation module.
//!
//! Cost layers, FIFO movement valuation, the item snapshot type and SKU
//! allocation. Pure domain logic only (no IO, no clocks).

pub mod item;
pub mod layer;
pub mod movement;
pub mod sku;

pub use item::{DraftField, InventoryItem, categories};
pub use layer::{
    CostLayer, initial_layers, merge_layers, total_quantity, total_value, weighted_unit_cost,
};
pub use movement::{CostMovement, MovementRequest, compute_movement};
pub use sku::{SkuFormat, extract_sku_number, next_sku_number};
