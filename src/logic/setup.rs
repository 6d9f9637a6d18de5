//! Programmatic setup and prescription data: crop, varieties, products,
//! grower/farm/field with boundary, crop zone, and a three-zone seeding Rx.

use super::rx::{self, PrescriptionBuilder};
use crate::datasources::{RepresentationRegistry, UnitRegistry};
use crate::error::{FieldOpsError, Result};
use crate::models::{
    ring, Catalog, Crop, CropZone, Dataset, DateContext, Farm, Field, FieldBoundary, Grower,
    IdSequence, MultiPolygon, NumericRepresentationValue, Polygon, Product, ProductForm,
    ProductType, ReferenceId, RxProductLookup, TimeScope,
};
use chrono::{TimeZone, Utc};
use tracing::info;

const SEASON_YEAR: i32 = 2021;

fn hole_one() -> Vec<(f64, f64)> {
    vec![
        (-89.487719, 40.478091),
        (-89.487536, 40.478091),
        (-89.487536, 40.477960),
        (-89.487719, 40.477960),
        (-89.487719, 40.478091),
    ]
}

fn hole_two() -> Vec<(f64, f64)> {
    vec![
        (-89.486732, 40.478172),
        (-89.486453, 40.478172),
        (-89.486453, 40.478082),
        (-89.486732, 40.478082),
        (-89.486732, 40.478172),
    ]
}

fn field_boundary() -> Polygon {
    Polygon::new(ring(&[
        (-89.488565, 40.478304),
        (-89.485439, 40.478304),
        (-89.485439, 40.475010),
        (-89.488565, 40.475010),
    ]))
    .with_hole(ring(&hole_one()))
    .with_hole(ring(&hole_two()))
}

fn north_zone() -> Polygon {
    Polygon::new(ring(&[
        (-89.488565, 40.478304),
        (-89.485439, 40.478304),
        (-89.485439, 40.477404),
        (-89.488565, 40.477756),
        (-89.488565, 40.478304),
    ]))
    .with_hole(ring(&hole_one()))
    .with_hole(ring(&hole_two()))
}

fn middle_zone() -> Polygon {
    Polygon::new(ring(&[
        (-89.488565, 40.477756),
        (-89.485439, 40.477404),
        (-89.485439, 40.476688),
        (-89.488565, 40.476688),
        (-89.488565, 40.477756),
    ]))
}

fn south_zone() -> Polygon {
    Polygon::new(ring(&[
        (-89.488565, 40.476688),
        (-89.485439, 40.476688),
        (-89.485439, 40.475010),
        (-89.488565, 40.475010),
        (-89.488565, 40.476688),
    ]))
}

fn rx_lookup<R>(
    registry: &R,
    ids: &mut IdSequence,
    product_id: ReferenceId,
    representation: &str,
    unit: &str,
) -> Result<RxProductLookup>
where
    R: UnitRegistry + RepresentationRegistry,
{
    Ok(RxProductLookup {
        id: ids.next_id(),
        product_id,
        representation: registry.resolve_representation(representation)?,
        unit: registry.resolve_unit(unit)?,
    })
}

/// Build the setup catalog and its seeding prescription, ready for export.
pub fn reference_dataset<R>(registry: &R) -> Result<Dataset>
where
    R: UnitRegistry + RepresentationRegistry,
{
    let mut ids = IdSequence::new();
    let mut catalog = Catalog::default();

    let corn = Crop {
        id: ids.next_id(),
        name: "Corn".to_string(),
        unique_ids: Vec::new(),
    };

    let variety1 = Product::new(ids.next_id(), "Variety 1", ProductType::Variety).with_crop(corn.id);
    let variety2 = Product::new(ids.next_id(), "Variety 2", ProductType::Variety).with_crop(corn.id);
    let starter =
        Product::new(ids.next_id(), "Starter", ProductType::Fertilizer).with_form(ProductForm::Liquid);
    let insecticide =
        Product::new(ids.next_id(), "Insecticide", ProductType::Chemical).with_form(ProductForm::Solid);

    let grower = Grower {
        id: ids.next_id(),
        name: "Example Grower".to_string(),
        unique_ids: Vec::new(),
    };
    let farm = Farm {
        id: ids.next_id(),
        description: "Example Farm".to_string(),
        grower_id: Some(grower.id),
    };
    let mut field = Field {
        id: ids.next_id(),
        description: "Example Field".to_string(),
        farm_id: Some(farm.id),
        grower_id: Some(grower.id),
        area: Some(NumericRepresentationValue::new(
            registry.resolve_representation("vrReportedFieldArea")?,
            23.0,
            registry.resolve_unit("ha")?,
        )?),
        active_boundary_id: None,
        unique_ids: Vec::new(),
    };

    let season_start = Utc
        .with_ymd_and_hms(SEASON_YEAR, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| FieldOpsError::InvalidData("invalid crop season start".to_string()))?;
    let crop_zone = CropZone {
        id: ids.next_id(),
        field_id: field.id,
        crop_id: Some(corn.id),
        time_scopes: vec![TimeScope::new(DateContext::CropSeason, season_start)],
    };

    let boundary = FieldBoundary {
        id: ids.next_id(),
        field_id: field.id,
        spatial_data: MultiPolygon::from(field_boundary()),
    };
    field.active_boundary_id = Some(boundary.id);

    let seed_rate1 = rx_lookup(registry, &mut ids, variety1.id, "vrSeedRateSeedsTarget", "seeds1ac-1")?;
    let seed_rate2 = rx_lookup(registry, &mut ids, variety2.id, "vrSeedRateSeedsTarget", "seeds1ac-1")?;
    let starter_rate = rx_lookup(registry, &mut ids, starter.id, "vrAppRateVolumeTarget", "gal1ac-1")?;
    let seed_depth1 = rx_lookup(registry, &mut ids, variety1.id, "vrSeedDepthTarget", "cm")?;
    let seed_depth2 = rx_lookup(registry, &mut ids, variety2.id, "vrSeedDepthTarget", "cm")?;
    let insecticide_rate = rx_lookup(registry, &mut ids, insecticide.id, "vrAppRateMassTarget", "lb1ac-1")?;

    let prescription = PrescriptionBuilder::new(ids.next_id(), "Test Prescription", field.id)
        .crop_zone(crop_zone.id)
        .lookup(&seed_rate1)
        .lookup(&seed_rate2)
        .lookup(&starter_rate)
        .lookup(&seed_depth1)
        .lookup(&seed_depth2)
        .lookup(&insecticide_rate)
        .zone(
            north_zone(),
            &[
                (&seed_rate1, 32000.0),
                (&seed_depth1, 4.0),
                (&starter_rate, 7.0),
                (&insecticide_rate, 5.0),
            ],
        )
        .zone(
            middle_zone(),
            &[
                (&seed_rate1, 34000.0),
                (&seed_depth1, 5.0),
                (&starter_rate, 4.0),
                (&insecticide_rate, 2.5),
            ],
        )
        .zone(
            south_zone(),
            &[
                (&seed_rate2, 29000.0),
                (&seed_depth2, 6.0),
                (&starter_rate, 6.0),
                (&insecticide_rate, 2.75),
            ],
        )
        .build();

    catalog.crops.push(corn);
    catalog.products = vec![variety1, variety2, starter, insecticide];
    catalog.growers.push(grower);
    catalog.farms.push(farm);
    catalog.fields.push(field);
    catalog.crop_zones.push(crop_zone);
    catalog.field_boundaries.push(boundary);

    rx::validate(&prescription, &catalog)?;
    info!(
        "Built prescription '{}' with {} zones",
        prescription.description,
        prescription.rx_shape_lookups.len()
    );
    catalog.prescriptions.push(prescription);

    Ok(Dataset {
        catalog,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::StandardRegistry;
    use crate::models::Point;
    use chrono::Datelike;

    fn dataset() -> Dataset {
        reference_dataset(&StandardRegistry::standard()).unwrap()
    }

    fn product_id(dataset: &Dataset, description: &str) -> ReferenceId {
        dataset
            .catalog
            .products
            .iter()
            .find(|p| p.description == description)
            .map(|p| p.id)
            .unwrap()
    }

    fn rates(dataset: &Dataset, point: Point) -> Vec<(String, ReferenceId, f64)> {
        dataset.catalog.prescriptions[0]
            .rates_at(&point)
            .into_iter()
            .map(|r| (r.representation_code, r.product_id, r.rate))
            .collect()
    }

    #[test]
    fn catalog_contents() {
        let dataset = dataset();
        let catalog = &dataset.catalog;
        assert_eq!(catalog.crops[0].name, "Corn");
        assert_eq!(catalog.products.len(), 4);
        assert_eq!(catalog.field_boundaries[0].spatial_data.polygons[0].interior_rings.len(), 2);

        let field = &catalog.fields[0];
        assert_eq!(field.area.as_ref().map(|a| a.value()), Some(23.0));
        assert_eq!(field.active_boundary_id, Some(catalog.field_boundaries[0].id));

        let season = catalog.crop_zones[0]
            .time_scope(DateContext::CropSeason)
            .and_then(|t| t.timestamp1)
            .unwrap();
        assert_eq!(season.year(), 2021);

        let rx = &catalog.prescriptions[0];
        assert_eq!(rx.rx_product_lookups.len(), 6);
        assert_eq!(rx.rx_shape_lookups.len(), 3);
        assert_eq!(rx.crop_zone_id, Some(catalog.crop_zones[0].id));
    }

    #[test]
    fn each_zone_returns_its_own_rates() {
        let dataset = dataset();
        let v1 = product_id(&dataset, "Variety 1");
        let v2 = product_id(&dataset, "Variety 2");
        let starter = product_id(&dataset, "Starter");
        let insecticide = product_id(&dataset, "Insecticide");

        let north = rates(&dataset, Point::new(-89.4860, 40.4780));
        assert_eq!(
            north,
            vec![
                ("vrSeedRateSeedsTarget".to_string(), v1, 32000.0),
                ("vrAppRateVolumeTarget".to_string(), starter, 7.0),
                ("vrSeedDepthTarget".to_string(), v1, 4.0),
                ("vrAppRateMassTarget".to_string(), insecticide, 5.0),
            ]
        );

        let middle = rates(&dataset, Point::new(-89.4870, 40.4770));
        assert_eq!(
            middle,
            vec![
                ("vrSeedRateSeedsTarget".to_string(), v1, 34000.0),
                ("vrAppRateVolumeTarget".to_string(), starter, 4.0),
                ("vrSeedDepthTarget".to_string(), v1, 5.0),
                ("vrAppRateMassTarget".to_string(), insecticide, 2.5),
            ]
        );

        let south = rates(&dataset, Point::new(-89.4870, 40.4758));
        assert_eq!(
            south,
            vec![
                ("vrSeedRateSeedsTarget".to_string(), v2, 29000.0),
                ("vrAppRateVolumeTarget".to_string(), starter, 6.0),
                ("vrSeedDepthTarget".to_string(), v2, 6.0),
                ("vrAppRateMassTarget".to_string(), insecticide, 2.75),
            ]
        );
    }

    #[test]
    fn rate_at_by_product() {
        let dataset = dataset();
        let rx = &dataset.catalog.prescriptions[0];
        let v1 = product_id(&dataset, "Variety 1");
        let v2 = product_id(&dataset, "Variety 2");

        assert_eq!(rx.rate_at(&Point::new(-89.4860, 40.4780), v1).map(|r| r.rate), Some(32000.0));
        assert_eq!(rx.rate_at(&Point::new(-89.4870, 40.4770), v1).map(|r| r.rate), Some(34000.0));
        assert_eq!(rx.rate_at(&Point::new(-89.4870, 40.4758), v2).map(|r| r.rate), Some(29000.0));
        assert!(rx.rate_at(&Point::new(-89.4870, 40.4758), v1).is_none());
    }

    #[test]
    fn uncovered_points_have_no_rate() {
        let dataset = dataset();
        let rx = &dataset.catalog.prescriptions[0];
        assert!(rates(&dataset, Point::new(-89.4800, 40.4770)).is_empty());
        // Inside the first boundary hole.
        assert!(rates(&dataset, Point::new(-89.4876, 40.4780)).is_empty());
        assert!(rx.rate_at(&Point::new(-89.4876, 40.4780), rx.product_ids()[0]).is_none());
    }

    #[test]
    fn unknown_registry_codes_fail() {
        let empty = StandardRegistry::empty();
        assert!(matches!(
            reference_dataset(&empty),
            Err(FieldOpsError::UnknownCode { .. })
        ));
    }
}
