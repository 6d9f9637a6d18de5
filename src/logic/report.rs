use super::aggregation::{aggregate, Envelope, SensorSummary};
use super::coincident::group_coincident;
use super::equipment::{EquipmentLayout, EquipmentSummary, Measure};
use super::hierarchy::DeviceHierarchy;
use super::working_data::{VarietyLayout, WorkingDataIndex};
use crate::datasources::SpatialRecordSource;
use crate::error::Result;
use crate::models::{
    Catalog, Dataset, DateContext, Diagnostic, LoggedData, OperationData, OperationType,
    ProductType, ReferenceId, RepresentationValue, StampedMeteredValues, UniqueId,
    MONITOR_ID_SOURCE,
};
use chrono::{DateTime, Datelike, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Logistics {
    pub grower: Option<String>,
    pub farm: Option<String>,
    pub field: Option<String>,
    pub field_monitor_id: Option<String>,
    pub crop: Option<String>,
    pub crop_monitor_id: Option<String>,
    pub growing_season: Option<i32>,
}

fn monitor_id(ids: &[UniqueId]) -> Option<String> {
    ids.iter()
        .find(|u| u.source == MONITOR_ID_SOURCE)
        .map(|u| u.id.clone())
}

impl Logistics {
    pub fn build(catalog: &Catalog, logged: &LoggedData) -> Self {
        let mut logistics = Logistics::default();

        if let Some(id) = logged.grower_id {
            match catalog.grower(id) {
                Some(grower) => logistics.grower = Some(grower.name.clone()),
                None => warn!("Grower {} not found", id),
            }
        }
        if let Some(id) = logged.farm_id {
            match catalog.farm(id) {
                Some(farm) => logistics.farm = Some(farm.description.clone()),
                None => warn!("Farm {} not found", id),
            }
        }
        if let Some(id) = logged.field_id {
            match catalog.field(id) {
                Some(field) => {
                    logistics.field = Some(field.description.clone());
                    logistics.field_monitor_id = monitor_id(&field.unique_ids);
                }
                None => warn!("Field {} not found", id),
            }
        }

        let crop_zone = logged.crop_zone_id.and_then(|id| {
            let zone = catalog.crop_zone(id);
            if zone.is_none() {
                warn!("Crop zone {} not found", id);
            }
            zone
        });
        if let Some(zone) = crop_zone {
            if let Some(crop_id) = zone.crop_id {
                match catalog.crop(crop_id) {
                    Some(crop) => {
                        logistics.crop = Some(crop.name.clone());
                        logistics.crop_monitor_id = monitor_id(&crop.unique_ids);
                    }
                    None => warn!("Crop {} not found", crop_id),
                }
            }
            logistics.growing_season = zone
                .time_scope(DateContext::CropSeason)
                .and_then(|t| t.timestamp1)
                .map(|t| t.year());
        }

        logistics
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentEntry {
    pub description: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductEntry {
    pub id: ReferenceId,
    pub description: String,
    pub product_type: ProductType,
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOverview {
    pub operation_types: Vec<OperationType>,
    pub region_count: usize,
    /// First operation and its coincident ids, when more than one type was logged.
    pub first_region_operation_ids: Vec<ReferenceId>,
    pub products: Vec<ProductEntry>,
}

impl OperationOverview {
    pub fn build(catalog: &Catalog, logged: &LoggedData) -> Self {
        let mut operation_types = Vec::new();
        for op in &logged.operation_data {
            if !operation_types.contains(&op.operation_type) {
                operation_types.push(op.operation_type);
            }
        }

        let region_count = match operation_types.len() {
            0 => 0,
            types => logged.operation_data.len() / types,
        };

        let first_region_operation_ids = match logged.operation_data.first() {
            Some(first) if operation_types.len() > 1 => std::iter::once(first.id)
                .chain(first.coincident_operation_data_ids.iter().copied())
                .collect(),
            _ => Vec::new(),
        };

        let mut product_ids: Vec<ReferenceId> = Vec::new();
        for id in logged.operation_data.iter().flat_map(|op| &op.product_ids) {
            if !product_ids.contains(id) {
                product_ids.push(*id);
            }
        }

        let products = product_ids
            .into_iter()
            .filter_map(|id| {
                let Some(product) = catalog.product(id) else {
                    warn!("Product {} not found", id);
                    return None;
                };
                let components = if product.product_type == ProductType::Mix {
                    product
                        .components
                        .iter()
                        .filter_map(|c| {
                            let description = if c.is_product {
                                catalog.product(c.ingredient_id).map(|p| p.description.clone())
                            } else {
                                catalog.ingredient(c.ingredient_id).map(|i| i.description.clone())
                            };
                            let Some(description) = description else {
                                warn!("Mix component {} not found", c.ingredient_id);
                                return None;
                            };
                            Some(ComponentEntry {
                                description,
                                quantity: c.quantity.as_ref().map(|q| q.value()).unwrap_or(0.0),
                                unit: c
                                    .quantity
                                    .as_ref()
                                    .map(|q| q.unit().code.clone())
                                    .unwrap_or_else(|| "count".to_string()),
                            })
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                Some(ProductEntry {
                    id,
                    description: product.description.clone(),
                    product_type: product.product_type,
                    components,
                })
            })
            .collect();

        Self {
            operation_types,
            region_count,
            first_region_operation_ids,
            products,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeteredTotal {
    pub description: String,
    pub total: Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTotals {
    pub product_id: ReferenceId,
    pub product: Option<String>,
    pub totals: Vec<MeteredTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub totals: Vec<MeteredTotal>,
    pub by_product: Vec<ProductTotals>,
}

fn metered_totals(data: &[StampedMeteredValues]) -> Vec<MeteredTotal> {
    data.iter()
        .flat_map(|stamped| &stamped.values)
        .filter_map(|metered| match &metered.value {
            RepresentationValue::Numeric(v) => Some(MeteredTotal {
                description: v.representation().description().to_string(),
                total: v.into(),
            }),
            RepresentationValue::Enumerated(_) => None,
        })
        .collect()
}

impl TaskSummary {
    pub fn build(dataset: &Dataset, logged: &LoggedData) -> Option<Self> {
        let id = logged.summary_id?;
        let Some(summary) = dataset.summary(id) else {
            warn!("Summary {} not found", id);
            return None;
        };

        let (start, end) = match summary.actual_span() {
            Some((start, end)) => (Some(start), end),
            None => (None, None),
        };

        let by_product = summary
            .operation_summaries
            .iter()
            .map(|op| ProductTotals {
                product_id: op.product_id,
                product: dataset
                    .catalog
                    .product(op.product_id)
                    .map(|p| p.description.clone()),
                totals: metered_totals(&op.data),
            })
            .collect();

        Some(Self {
            start,
            end,
            totals: metered_totals(&summary.summary_data),
            by_product,
        })
    }
}

/// A sensor's statistics with the machine part that reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledSensor {
    pub label: String,
    #[serde(flatten)]
    pub summary: SensorSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub operation_data_id: ReferenceId,
    pub operation_type: OperationType,
    pub variety_layout: VarietyLayout,
    pub record_count: u64,
    pub envelope: Option<Envelope>,
    pub sensors: Vec<LabelledSensor>,
    pub product_sample_counts: BTreeMap<ReferenceId, u64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl OperationReport {
    /// One pass over the operation's records.
    pub fn build<S>(catalog: &Catalog, operation: &OperationData, source: &S) -> Result<Self>
    where
        S: SpatialRecordSource + ?Sized,
    {
        let index = WorkingDataIndex::build(operation);
        let working_datas = index.all_working_datas();
        let result = aggregate(&index, &working_datas, source.records(operation)?)?;

        let variety_layout = VarietyLayout::classify(&index, catalog, result.first_record.as_ref());

        let sensors = result
            .sensors
            .into_iter()
            .map(|summary| {
                let part = summary
                    .device_configuration_id
                    .and_then(|id| catalog.configuration(id))
                    .map(|c| c.description.as_str())
                    .unwrap_or("Unknown device");
                LabelledSensor {
                    label: format!("{}-{}", part, summary.description),
                    summary,
                }
            })
            .collect();

        Ok(Self {
            operation_data_id: operation.id,
            operation_type: operation.operation_type,
            variety_layout,
            record_count: result.record_count,
            envelope: result.envelope,
            sensors,
            product_sample_counts: result.product_sample_counts,
            diagnostics: result.diagnostics,
        })
    }
}

/// Structured description of one logged field operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOperationReport {
    pub logged_data_id: ReferenceId,
    pub logistics: Logistics,
    pub overview: OperationOverview,
    pub task_summary: Option<TaskSummary>,
    pub equipment_configuration_count: usize,
    pub equipment: Option<EquipmentSummary>,
    pub coincident_groups: Vec<Vec<ReferenceId>>,
    pub operations: Vec<OperationReport>,
}

impl FieldOperationReport {
    pub fn build<S>(
        dataset: &Dataset,
        logged: &LoggedData,
        source: &S,
        max_hierarchy_depth: usize,
    ) -> Result<Self>
    where
        S: SpatialRecordSource + Sync + ?Sized,
    {
        let catalog = &dataset.catalog;
        let hierarchy = DeviceHierarchy::new(catalog).with_max_depth(max_hierarchy_depth);

        let equipment = match logged
            .operation_data
            .first()
            .and_then(|op| op.equipment_configuration_id())
            .and_then(|id| logged.equipment_configuration(id))
        {
            Some(config) => {
                let layout = EquipmentLayout::resolve(catalog, config);
                Some(EquipmentSummary::build(&hierarchy, &layout)?)
            }
            None => {
                warn!("No equipment configuration for logged data {}", logged.id);
                None
            }
        };

        let operations = logged
            .operation_data
            .par_iter()
            .map(|op| OperationReport::build(catalog, op, source))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Built report for logged data {} ({} operations)",
            logged.id,
            operations.len()
        );

        Ok(Self {
            logged_data_id: logged.id,
            logistics: Logistics::build(catalog, logged),
            overview: OperationOverview::build(catalog, logged),
            task_summary: TaskSummary::build(dataset, logged),
            equipment_configuration_count: logged.equipment_configurations.len(),
            equipment,
            coincident_groups: group_coincident(&logged.operation_data),
            operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::MemoryRecordSource;
    use crate::logic::equipment::tests::tractor_and_planter;
    use crate::logic::hierarchy::DEFAULT_MAX_DEPTH;
    use crate::models::{
        ConfigurationGeometry, CropZone, DeviceElementConfiguration, DeviceElementUse,
        EquipmentConfiguration, Farm, Field, Grower, Ingredient, MeteredValue,
        NumericRepresentationValue, OperationSummary, Point, Product, ProductComponent,
        Representation, SectionConfiguration, SpatialRecord, Summary, TimeScope, UnitOfMeasure,
        Crop, WorkingData,
    };
    use chrono::{TimeZone, Timelike};
    use std::sync::Arc;

    fn numeric(code: &str, description: &str, value: f64, unit: &str) -> NumericRepresentationValue {
        NumericRepresentationValue::new(
            Arc::new(Representation::numeric(code, description)),
            value,
            UnitOfMeasure::new(unit),
        )
        .unwrap()
    }

    fn planting_dataset() -> (Dataset, EquipmentConfiguration) {
        let (mut catalog, equipment) = tractor_and_planter();
        catalog.growers.push(Grower {
            id: 100,
            name: "Example Grower".to_string(),
            unique_ids: Vec::new(),
        });
        catalog.farms.push(Farm {
            id: 101,
            description: "Example Farm".to_string(),
            grower_id: Some(100),
        });
        catalog.fields.push(Field {
            id: 102,
            description: "North 40".to_string(),
            farm_id: Some(101),
            grower_id: Some(100),
            area: None,
            active_boundary_id: None,
            unique_ids: vec![UniqueId::new("F-17", MONITOR_ID_SOURCE)],
        });
        catalog.crops.push(Crop {
            id: 103,
            name: "Corn".to_string(),
            unique_ids: Vec::new(),
        });
        let season = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        catalog.crop_zones.push(CropZone {
            id: 104,
            field_id: 102,
            crop_id: Some(103),
            time_scopes: vec![TimeScope::new(DateContext::CropSeason, season)],
        });
        catalog.ingredients.push(Ingredient {
            id: 105,
            description: "Nitrogen".to_string(),
        });
        catalog.products = vec![
            Product::new(200, "Variety 1", ProductType::Variety),
            Product::new(201, "Starter Mix", ProductType::Mix),
        ];
        catalog.products[1].components = vec![
            ProductComponent {
                ingredient_id: 105,
                is_product: false,
                quantity: Some(numeric("vrProductQuantity", "Quantity", 28.0, "prcnt")),
            },
            ProductComponent {
                ingredient_id: 200,
                is_product: true,
                quantity: None,
            },
        ];

        let seed_rate = WorkingData {
            id: 1,
            device_element_use_id: 50,
            representation: Arc::new(Representation::numeric("vrSeedRateSeedsActual", "Seed Rate")),
        };
        let mut planting = OperationData::new(10, OperationType::SowingAndPlanting).with_coincident(&[11]);
        planting.product_ids = vec![200];
        planting.equipment_configuration_ids = vec![equipment.id];
        planting.device_element_uses = vec![DeviceElementUse {
            id: 50,
            operation_data_id: 10,
            depth: 0,
            order: 0,
            device_configuration_id: 12,
            working_datas: vec![seed_rate],
        }];
        let mut fertilizing = OperationData::new(11, OperationType::Fertilizing);
        fertilizing.product_ids = vec![201];
        fertilizing.equipment_configuration_ids = vec![equipment.id];

        let start = Utc.with_ymd_and_hms(2021, 4, 20, 13, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2021, 4, 20, 17, 30, 0).unwrap();
        let summary = Summary {
            id: 300,
            time_scopes: vec![crate::models::TimeScope {
                date_context: DateContext::ActualStart,
                timestamp1: Some(start),
                timestamp2: Some(end),
            }],
            summary_data: vec![StampedMeteredValues {
                timestamp: Some(start),
                values: vec![MeteredValue {
                    value: numeric("vrTotalAreaCovered", "Total Area Covered", 38.4, "ac").into(),
                }],
            }],
            operation_summaries: vec![OperationSummary {
                product_id: 200,
                operation_type: Some(OperationType::SowingAndPlanting),
                data: vec![StampedMeteredValues {
                    timestamp: Some(start),
                    values: vec![MeteredValue {
                        value: numeric("vrSeedRateSeedsActual", "Seed Rate", 32100.0, "seeds1ac-1").into(),
                    }],
                }],
            }],
        };

        let logged = LoggedData {
            id: 1,
            description: Some("Planting 2021".to_string()),
            grower_id: Some(100),
            farm_id: Some(101),
            field_id: Some(102),
            crop_zone_id: Some(104),
            summary_id: Some(300),
            operation_data: vec![planting, fertilizing],
            equipment_configurations: vec![equipment.clone()],
        };

        let mut dataset = Dataset::default();
        dataset.catalog = catalog;
        dataset.documents.logged_data.push(logged);
        dataset.documents.summaries.push(summary);
        (dataset, equipment)
    }

    fn source() -> MemoryRecordSource {
        let seed = |v| numeric("vrSeedRateSeedsActual", "Seed Rate", v, "seeds1ac-1");
        MemoryRecordSource::new().with_records(
            10,
            vec![
                SpatialRecord::new(Point::new(-89.48, 40.47)).with_value(1, seed(32000.0)),
                SpatialRecord::new(Point::new(-89.47, 40.48)).with_value(1, seed(33000.0)),
            ],
        )
    }

    fn report() -> FieldOperationReport {
        let (dataset, _) = planting_dataset();
        let logged = &dataset.documents.logged_data[0];
        FieldOperationReport::build(&dataset, logged, &source(), DEFAULT_MAX_DEPTH).unwrap()
    }

    #[test]
    fn logistics_section() {
        let report = report();
        assert_eq!(report.logistics.grower.as_deref(), Some("Example Grower"));
        assert_eq!(report.logistics.farm.as_deref(), Some("Example Farm"));
        assert_eq!(report.logistics.field.as_deref(), Some("North 40"));
        assert_eq!(report.logistics.field_monitor_id.as_deref(), Some("F-17"));
        assert_eq!(report.logistics.crop.as_deref(), Some("Corn"));
        assert_eq!(report.logistics.crop_monitor_id, None);
        assert_eq!(report.logistics.growing_season, Some(2021));
    }

    #[test]
    fn missing_logistics_references_are_skipped() {
        let (dataset, _) = planting_dataset();
        let mut logged = dataset.documents.logged_data[0].clone();
        logged.grower_id = Some(999);
        logged.crop_zone_id = Some(999);
        let logistics = Logistics::build(&dataset.catalog, &logged);
        assert!(logistics.grower.is_none());
        assert!(logistics.crop.is_none());
        assert_eq!(logistics.farm.as_deref(), Some("Example Farm"));
    }

    #[test]
    fn overview_types_regions_and_mix_components() {
        let report = report();
        let overview = &report.overview;
        assert_eq!(
            overview.operation_types,
            vec![OperationType::SowingAndPlanting, OperationType::Fertilizing]
        );
        assert_eq!(overview.region_count, 1);
        assert_eq!(overview.first_region_operation_ids, vec![10, 11]);

        assert_eq!(overview.products.len(), 2);
        let mix = &overview.products[1];
        assert_eq!(mix.product_type, ProductType::Mix);
        assert_eq!(
            mix.components,
            vec![
                ComponentEntry {
                    description: "Nitrogen".to_string(),
                    quantity: 28.0,
                    unit: "prcnt".to_string(),
                },
                ComponentEntry {
                    description: "Variety 1".to_string(),
                    quantity: 0.0,
                    unit: "count".to_string(),
                },
            ]
        );
    }

    #[test]
    fn task_summary_totals() {
        let report = report();
        let summary = report.task_summary.unwrap();
        assert_eq!(summary.end.map(|e| e.hour()), Some(17));
        assert_eq!(summary.totals[0].description, "Total Area Covered");
        assert_eq!(summary.totals[0].total.value, 38.4);
        assert_eq!(summary.by_product[0].product.as_deref(), Some("Variety 1"));
        assert_eq!(summary.by_product[0].totals[0].total.unit, "seeds1ac-1");
    }

    #[test]
    fn equipment_and_coincident_sections() {
        let report = report();
        assert_eq!(report.equipment_configuration_count, 1);
        let equipment = report.equipment.unwrap();
        assert_eq!(equipment.equipment_configuration_id, 40);
        assert_eq!(equipment.implement_hierarchy.len(), 3);
        assert_eq!(report.coincident_groups, vec![vec![10, 11]]);
    }

    #[test]
    fn operation_sections_are_labelled_by_device() {
        let report = report();
        assert_eq!(report.operations.len(), 2);

        let planting = &report.operations[0];
        assert_eq!(planting.record_count, 2);
        assert_eq!(planting.variety_layout, VarietyLayout::Single);
        assert_eq!(planting.sensors.len(), 1);
        assert_eq!(planting.sensors[0].label, "Planter-Seed Rate");
        assert_eq!(planting.sensors[0].summary.as_numeric().map(|n| n.mean), Some(32500.0));

        let fertilizing = &report.operations[1];
        assert_eq!(fertilizing.record_count, 0);
        assert!(fertilizing.envelope.is_none());
    }

    #[test]
    fn report_serializes_to_json() {
        let report = report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["logistics"]["grower"], "Example Grower");
        assert_eq!(json["operations"][0]["sensors"][0]["statistics"]["kind"], "numeric");
        assert_eq!(json["operations"][0]["variety_layout"]["layout"], "single");
    }

    #[test]
    fn unknown_device_label() {
        let (dataset, _) = planting_dataset();
        let mut catalog = dataset.catalog.clone();
        catalog.device_element_configurations.retain(|c| c.id != 12);
        catalog.device_element_configurations.push(DeviceElementConfiguration {
            id: 77,
            device_element_id: 2,
            description: "Spare".to_string(),
            geometry: ConfigurationGeometry::Section(SectionConfiguration::default()),
        });
        let op = &dataset.documents.logged_data[0].operation_data[0];
        let report = OperationReport::build(&catalog, op, &source()).unwrap();
        assert_eq!(report.sensors[0].label, "Unknown device-Seed Rate");
    }
}
