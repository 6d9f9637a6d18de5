use crate::models::{
    Catalog, DeviceElementUse, OperationData, OperationType, ReferenceId, RepresentationValue,
    SpatialRecord, WorkingData,
};
use serde::Serialize;
use std::collections::HashMap;

/// Representation code of the per-row sensor that reports which product is planted.
pub const PRODUCT_INDEX_CODE: &str = "vrProductIndex";

/// Use and working-data lookups for one operation, built once and reused per record.
pub struct WorkingDataIndex<'a> {
    operation: &'a OperationData,
    by_depth: HashMap<u8, Vec<&'a DeviceElementUse>>,
    owners: HashMap<ReferenceId, &'a DeviceElementUse>,
    working_datas: HashMap<ReferenceId, &'a WorkingData>,
}

impl<'a> WorkingDataIndex<'a> {
    pub fn build(operation: &'a OperationData) -> Self {
        let mut by_depth: HashMap<u8, Vec<&'a DeviceElementUse>> = HashMap::new();
        let mut owners = HashMap::new();
        let mut working_datas = HashMap::new();

        for deu in &operation.device_element_uses {
            if deu.depth > operation.max_depth {
                continue;
            }
            by_depth.entry(deu.depth).or_default().push(deu);
            for wd in &deu.working_datas {
                owners.insert(wd.id, deu);
                working_datas.insert(wd.id, wd);
            }
        }

        Self {
            operation,
            by_depth,
            owners,
            working_datas,
        }
    }

    pub fn operation(&self) -> &'a OperationData {
        self.operation
    }

    /// Uses instantiated at `depth`, in input order. Empty beyond the operation's max depth.
    pub fn uses_at_depth(&self, depth: u8) -> &[&'a DeviceElementUse] {
        self.by_depth
            .get(&depth)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn working_datas_of(&self, deu: &'a DeviceElementUse) -> &'a [WorkingData] {
        &deu.working_datas
    }

    /// Every working data from depth 0 to the max depth, shallowest first.
    pub fn all_working_datas(&self) -> Vec<&'a WorkingData> {
        (0..=self.operation.max_depth)
            .flat_map(|depth| self.uses_at_depth(depth).iter().copied())
            .flat_map(|deu| deu.working_datas.iter())
            .collect()
    }

    pub fn working_data(&self, id: ReferenceId) -> Option<&'a WorkingData> {
        self.working_datas.get(&id).copied()
    }

    pub fn owning_use(&self, working_data_id: ReferenceId) -> Option<&'a DeviceElementUse> {
        self.owners.get(&working_data_id).copied()
    }

    /// Configuration of the machine part that reported this working data.
    pub fn device_configuration_id(&self, working_data_id: ReferenceId) -> Option<ReferenceId> {
        self.owning_use(working_data_id)
            .map(|deu| deu.device_configuration_id)
    }

    pub fn product_index_working_datas(&self) -> Vec<&'a WorkingData> {
        self.all_working_datas()
            .into_iter()
            .filter(|wd| wd.representation.code() == PRODUCT_INDEX_CODE)
            .collect()
    }

    pub fn has_product_index(&self) -> bool {
        self.working_datas
            .values()
            .any(|wd| wd.representation.code() == PRODUCT_INDEX_CODE)
    }

    /// Product reported by a product-index sensor on this record.
    pub fn product_for_record(&self, working_data: &WorkingData, record: &SpatialRecord) -> ProductReading {
        product_reading(self.operation, working_data, record)
    }
}

/// Result of reading a product-index sensor on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductReading {
    NoData,
    Product { product_id: ReferenceId },
    OutOfRange { index: i64 },
}

/// The index is into `operation.product_ids`, and must be read on every record.
pub fn product_reading(operation: &OperationData, working_data: &WorkingData, record: &SpatialRecord) -> ProductReading {
    let Some(RepresentationValue::Numeric(value)) = record.meter_value(working_data) else {
        return ProductReading::NoData;
    };
    let index = value.value().round() as i64;
    usize::try_from(index)
        .ok()
        .and_then(|i| operation.product_ids.get(i))
        .map(|id| ProductReading::Product { product_id: *id })
        .unwrap_or(ProductReading::OutOfRange { index })
}

/// How varieties are laid out across a planter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum VarietyLayout {
    /// Depth-1 uses are variety slots named by their configuration; rows sit at depth 2.
    SplitPlanter { varieties: Vec<String> },
    /// Rows report a product index on every record.
    DynamicMultiHybrid {
        products: Vec<String>,
        first_point_assignment: Vec<RowAssignment>,
    },
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowAssignment {
    pub row: String,
    pub product: Option<String>,
}

impl VarietyLayout {
    /// Classify an operation. `first_record` resolves the per-row assignment of
    /// multi-hybrid data and is the first record of the aggregation pass.
    pub fn classify(
        index: &WorkingDataIndex<'_>,
        catalog: &Catalog,
        first_record: Option<&SpatialRecord>,
    ) -> Self {
        let op = index.operation();
        if op.operation_type != OperationType::SowingAndPlanting {
            return VarietyLayout::Single;
        }

        let configuration_name = |deu: &DeviceElementUse| {
            catalog
                .configuration(deu.device_configuration_id)
                .map(|c| c.description.clone())
                .unwrap_or_else(|| format!("Configuration {}", deu.device_configuration_id))
        };
        let product_name = |id: ReferenceId| {
            catalog
                .product(id)
                .map(|p| p.description.clone())
                .unwrap_or_else(|| {
                    tracing::warn!("Product {} not found in catalog", id);
                    format!("Product {}", id)
                })
        };

        if op.max_depth == 2 {
            let varieties = index
                .uses_at_depth(1)
                .iter()
                .map(|deu| configuration_name(*deu))
                .collect();
            return VarietyLayout::SplitPlanter { varieties };
        }

        if op.max_depth == 1 && index.has_product_index() {
            let products = op.product_ids.iter().map(|id| product_name(*id)).collect();
            let first_point_assignment = match first_record {
                Some(record) => index
                    .uses_at_depth(1)
                    .iter()
                    .copied()
                    .flat_map(|deu| {
                        deu.working_datas
                            .iter()
                            .filter(|wd| wd.representation.code() == PRODUCT_INDEX_CODE)
                            .map(move |wd| (deu, wd))
                    })
                    .map(|(deu, wd)| RowAssignment {
                        row: configuration_name(deu),
                        product: match index.product_for_record(wd, record) {
                            ProductReading::Product { product_id } => Some(product_name(product_id)),
                            _ => None,
                        },
                    })
                    .collect(),
                None => Vec::new(),
            };
            return VarietyLayout::DynamicMultiHybrid {
                products,
                first_point_assignment,
            };
        }

        VarietyLayout::Single
    }
}
