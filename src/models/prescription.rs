use super::{MultiPolygon, ReferenceId, Representation, UnitOfMeasure};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What is being rated: a product measured by a representation in a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxProductLookup {
    pub id: ReferenceId,
    pub product_id: ReferenceId,
    pub representation: Arc<Representation>,
    pub unit: UnitOfMeasure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxRate {
    pub rate: f64,
    pub rx_product_lookup_id: ReferenceId,
}

/// A zone and the rates that apply inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxShapeLookup {
    pub shape: MultiPolygon,
    #[serde(default)]
    pub rates: Vec<RxRate>,
}

/// Zones within one prescription are expected not to overlap for the same product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPrescription {
    pub id: ReferenceId,
    pub description: String,
    pub field_id: ReferenceId,
    #[serde(default)]
    pub crop_zone_id: Option<ReferenceId>,
    #[serde(default)]
    pub rx_product_lookups: Vec<RxProductLookup>,
    #[serde(default)]
    pub rx_shape_lookups: Vec<RxShapeLookup>,
}

impl VectorPrescription {
    pub fn lookup(&self, id: ReferenceId) -> Option<&RxProductLookup> {
        self.rx_product_lookups.iter().find(|l| l.id == id)
    }

    /// Distinct product ids in lookup order.
    pub fn product_ids(&self) -> Vec<ReferenceId> {
        let mut ids = Vec::new();
        for lookup in &self.rx_product_lookups {
            if !ids.contains(&lookup.product_id) {
                ids.push(lookup.product_id);
            }
        }
        ids
    }
}
