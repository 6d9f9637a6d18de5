pub mod aggregation;
pub mod coincident;
pub mod equipment;
pub mod hierarchy;
pub mod report;
pub mod rx;
pub mod setup;
pub mod working_data;

pub use aggregation::{aggregate, aggregate_blocks, aggregate_operation, AggregationResult, SpatialAggregator};
pub use coincident::group_coincident;
pub use equipment::{EquipmentLayout, EquipmentSummary};
pub use hierarchy::{DeviceHierarchy, HierarchyNode, DEFAULT_MAX_DEPTH};
pub use report::FieldOperationReport;
pub use rx::PrescriptionBuilder;
pub use working_data::{ProductReading, VarietyLayout, WorkingDataIndex};
