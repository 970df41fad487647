//! FIFO cost movement: consume sold units from the oldest layers, append
//! received units as a new layer, and value both sides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{EPSILON, finite_or};

use crate::layer::{CostLayer, merge_layers, total_quantity};

/// Inputs for one item's movement.
#[derive(Debug, Clone, Copy)]
pub struct MovementRequest<'a> {
    pub layers: &'a [CostLayer],
    pub sold: f64,
    pub received: f64,
    /// Cost of incoming units, and the oversell fallback when no layer remains.
    pub unit_cost: f64,
    /// Acquisition time stamped on the received layer. Previews pass `None`.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Resulting layers plus the monetary breakdown of a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMovement {
    pub layers: Vec<CostLayer>,
    pub total_quantity: f64,
    pub sold_value: f64,
    pub sold_unit_cost: f64,
    pub received_value: f64,
    pub received_unit_cost: f64,
    /// Units sold beyond what the layers held. Valued, never rejected.
    pub oversold: f64,
}

impl CostMovement {
    /// Net monetary effect: received value minus sold value.
    pub fn value_impact(&self) -> f64 {
        self.received_value - self.sold_value
    }

    pub fn is_oversell(&self) -> bool {
        self.oversold > EPSILON
    }
}

/// Compute the FIFO movement for one item.
///
/// Overselling is permitted: units sold beyond the tracked layers are valued
/// at the cost of the last remaining layer, or at `unit_cost` when every
/// layer was consumed, and the resulting layer set simply ends up empty.
/// Callers must not treat that as an error.
pub fn compute_movement(request: &MovementRequest<'_>) -> CostMovement {
    let sold = finite_or(request.sold, 0.0).max(0.0);
    let received = finite_or(request.received, 0.0).max(0.0);
    let unit_cost = finite_or(request.unit_cost, 0.0);

    let mut remaining_sold = sold;
    let mut sold_value = 0.0;
    let mut remainder: Vec<CostLayer> = Vec::with_capacity(request.layers.len() + 1);

    let working = request
        .layers
        .iter()
        .map(CostLayer::normalised)
        .filter(|layer| !layer.is_empty());

    for layer in working {
        if remaining_sold <= EPSILON {
            remainder.push(layer);
            continue;
        }
        let consumed = layer.quantity.min(remaining_sold);
        if consumed > EPSILON {
            sold_value += consumed * layer.unit_cost;
            remaining_sold -= consumed;
        }
        let leftover = layer.quantity - consumed;
        if leftover > EPSILON {
            remainder.push(CostLayer {
                quantity: leftover,
                ..layer
            });
        }
    }

    let mut oversold = 0.0;
    if remaining_sold > EPSILON {
        let fallback_cost = remainder.last().map_or(unit_cost, |layer| layer.unit_cost);
        sold_value += remaining_sold * fallback_cost;
        oversold = remaining_sold;
    }

    let mut received_value = 0.0;
    if received > EPSILON {
        received_value = received * unit_cost;
        remainder.push(CostLayer::new(received, unit_cost, request.timestamp));
    }

    let layers = merge_layers(remainder);
    let total_quantity = total_quantity(&layers);

    CostMovement {
        layers,
        total_quantity,
        sold_value,
        sold_unit_cost: if sold > EPSILON { sold_value / sold } else { 0.0 },
        received_value,
        received_unit_cost: if received > EPSILON { unit_cost } else { 0.0 },
        oversold,
    }
}
