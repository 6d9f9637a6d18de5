use crate::error::{FieldOpsError, Result};
use crate::models::{
    Catalog, Diagnostic, MultiPolygon, Point, ReferenceId, RxProductLookup, RxRate, RxShapeLookup,
    UnitOfMeasure, VectorPrescription,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Assembles a `VectorPrescription` zone by zone.
#[derive(Debug, Clone)]
pub struct PrescriptionBuilder {
    id: ReferenceId,
    description: String,
    field_id: ReferenceId,
    crop_zone_id: Option<ReferenceId>,
    lookups: Vec<RxProductLookup>,
    zones: Vec<RxShapeLookup>,
}

impl PrescriptionBuilder {
    pub fn new(id: ReferenceId, description: impl Into<String>, field_id: ReferenceId) -> Self {
        Self {
            id,
            description: description.into(),
            field_id,
            crop_zone_id: None,
            lookups: Vec::new(),
            zones: Vec::new(),
        }
    }

    pub fn crop_zone(mut self, crop_zone_id: ReferenceId) -> Self {
        self.crop_zone_id = Some(crop_zone_id);
        self
    }

    /// Register a lookup that no zone rates yet. Lookups are kept once per id.
    pub fn lookup(mut self, lookup: &RxProductLookup) -> Self {
        self.add_lookup(lookup);
        self
    }

    /// Add a zone rated by `(lookup, rate)` pairs, in order.
    pub fn zone(mut self, shape: impl Into<MultiPolygon>, rates: &[(&RxProductLookup, f64)]) -> Self {
        let rates = rates
            .iter()
            .map(|(lookup, rate)| {
                self.add_lookup(lookup);
                RxRate {
                    rate: *rate,
                    rx_product_lookup_id: lookup.id,
                }
            })
            .collect();
        self.zones.push(RxShapeLookup {
            shape: shape.into(),
            rates,
        });
        self
    }

    fn add_lookup(&mut self, lookup: &RxProductLookup) {
        if !self.lookups.iter().any(|l| l.id == lookup.id) {
            self.lookups.push(lookup.clone());
        }
    }

    pub fn build(self) -> VectorPrescription {
        VectorPrescription {
            id: self.id,
            description: self.description,
            field_id: self.field_id,
            crop_zone_id: self.crop_zone_id,
            rx_product_lookups: self.lookups,
            rx_shape_lookups: self.zones,
        }
    }
}

/// Check that every rate names a lookup of the prescription and every lookup a catalog product.
pub fn validate(prescription: &VectorPrescription, catalog: &Catalog) -> Result<()> {
    let lookup_ids: HashSet<ReferenceId> = prescription
        .rx_product_lookups
        .iter()
        .map(|l| l.id)
        .collect();

    for zone in &prescription.rx_shape_lookups {
        for rate in &zone.rates {
            if !lookup_ids.contains(&rate.rx_product_lookup_id) {
                return Err(FieldOpsError::not_found(
                    "rx product lookup",
                    rate.rx_product_lookup_id,
                ));
            }
        }
    }

    for lookup in &prescription.rx_product_lookups {
        catalog.require_product(lookup.product_id)?;
    }
    Ok(())
}

/// The rate that applies at a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub zone_index: usize,
    pub lookup_id: ReferenceId,
    pub product_id: ReferenceId,
    pub representation_code: String,
    pub rate: f64,
    pub unit: UnitOfMeasure,
    /// Other zones covering the point that also rate the product.
    pub shadowed_zones: Vec<usize>,
}

impl ResolvedRate {
    pub fn ambiguity(&self) -> Option<Diagnostic> {
        (!self.shadowed_zones.is_empty()).then(|| Diagnostic::ZoneOverlapAmbiguity {
            product_id: self.product_id,
            chosen_zone: self.zone_index,
            shadowed_zones: self.shadowed_zones.clone(),
        })
    }
}

impl VectorPrescription {
    /// Rate for `product_id` at `point`. Zones are expected not to overlap per
    /// product; when they do, the first zone in input order wins and the others
    /// are reported in `shadowed_zones`.
    pub fn rate_at(&self, point: &Point, product_id: ReferenceId) -> Option<ResolvedRate> {
        self.resolve(point, |lookup| lookup.product_id == product_id)
    }

    /// Rate for one specific lookup at `point`, same overlap policy as `rate_at`.
    pub fn lookup_rate_at(&self, point: &Point, lookup_id: ReferenceId) -> Option<ResolvedRate> {
        self.resolve(point, |lookup| lookup.id == lookup_id)
    }

    /// Every lookup's rate at `point`, in lookup order. Uncovered lookups are skipped.
    pub fn rates_at(&self, point: &Point) -> Vec<ResolvedRate> {
        self.rx_product_lookups
            .iter()
            .filter_map(|lookup| self.lookup_rate_at(point, lookup.id))
            .collect()
    }

    fn resolve<F>(&self, point: &Point, matches: F) -> Option<ResolvedRate>
    where
        F: Fn(&RxProductLookup) -> bool,
    {
        let mut candidates = self
            .rx_shape_lookups
            .iter()
            .enumerate()
            .filter(|(_, zone)| zone.shape.contains(point))
            .filter_map(|(i, zone)| {
                zone.rates.iter().find_map(|rate| {
                    self.lookup(rate.rx_product_lookup_id)
                        .filter(|&lookup| matches(lookup))
                        .map(|lookup| (i, rate, lookup))
                })
            });

        let (zone_index, rate, lookup) = candidates.next()?;
        let shadowed_zones: Vec<usize> = candidates.map(|(i, _, _)| i).collect();

        let resolved = ResolvedRate {
            zone_index,
            lookup_id: lookup.id,
            product_id: lookup.product_id,
            representation_code: lookup.representation.code().to_string(),
            rate: rate.rate,
            unit: lookup.unit.clone(),
            shadowed_zones,
        };
        if let Some(diagnostic) = resolved.ambiguity() {
            warn!("{}", diagnostic);
        }
        Some(resolved)
    }
}
