use super::{EquipmentConfiguration, Point, ReferenceId, Representation, RepresentationKind, RepresentationValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    SowingAndPlanting,
    Harvesting,
    Fertilizing,
    CropProtection,
    Tillage,
    Unknown,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::SowingAndPlanting => "SowingAndPlanting",
            OperationType::Harvesting => "Harvesting",
            OperationType::Fertilizing => "Fertilizing",
            OperationType::CropProtection => "CropProtection",
            OperationType::Tillage => "Tillage",
            OperationType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sensor definition bound to one device element use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingData {
    pub id: ReferenceId,
    pub device_element_use_id: ReferenceId,
    pub representation: Arc<Representation>,
}

impl WorkingData {
    pub fn kind(&self) -> RepresentationKind {
        self.representation.kind()
    }
}

/// One device element configuration instantiated in one operation at one depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceElementUse {
    pub id: ReferenceId,
    pub operation_data_id: ReferenceId,
    pub depth: u8,
    #[serde(default)]
    pub order: i32,
    pub device_configuration_id: ReferenceId,
    #[serde(default)]
    pub working_datas: Vec<WorkingData>,
}

/// One contiguous stream of a single operation type. Its spatial records are
/// produced by a `SpatialRecordSource`, never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationData {
    pub id: ReferenceId,
    pub operation_type: OperationType,
    #[serde(default)]
    pub max_depth: u8,
    #[serde(default)]
    pub product_ids: Vec<ReferenceId>,
    #[serde(default)]
    pub coincident_operation_data_ids: Vec<ReferenceId>,
    #[serde(default)]
    pub equipment_configuration_ids: Vec<ReferenceId>,
    #[serde(default)]
    pub device_element_uses: Vec<DeviceElementUse>,
}

impl OperationData {
    pub fn new(id: ReferenceId, operation_type: OperationType) -> Self {
        Self {
            id,
            operation_type,
            max_depth: 0,
            product_ids: Vec::new(),
            coincident_operation_data_ids: Vec::new(),
            equipment_configuration_ids: Vec::new(),
            device_element_uses: Vec::new(),
        }
    }

    pub fn with_coincident(mut self, ids: &[ReferenceId]) -> Self {
        self.coincident_operation_data_ids.extend_from_slice(ids);
        self
    }

    /// The single equipment configuration an operation is logged against.
    pub fn equipment_configuration_id(&self) -> Option<ReferenceId> {
        self.equipment_configuration_ids.first().copied()
    }
}

/// One field operation session (one monitor file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedData {
    pub id: ReferenceId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grower_id: Option<ReferenceId>,
    #[serde(default)]
    pub farm_id: Option<ReferenceId>,
    #[serde(default)]
    pub field_id: Option<ReferenceId>,
    #[serde(default)]
    pub crop_zone_id: Option<ReferenceId>,
    #[serde(default)]
    pub summary_id: Option<ReferenceId>,
    #[serde(default)]
    pub operation_data: Vec<OperationData>,
    #[serde(default)]
    pub equipment_configurations: Vec<EquipmentConfiguration>,
}

impl LoggedData {
    pub fn equipment_configuration(&self, id: ReferenceId) -> Option<&EquipmentConfiguration> {
        self.equipment_configurations.iter().find(|e| e.id == id)
    }
}

/// One geolocated sample. Values are keyed by working data id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRecord {
    pub geometry: Point,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    values: HashMap<ReferenceId, RepresentationValue>,
}

impl SpatialRecord {
    pub fn new(geometry: Point) -> Self {
        Self {
            geometry,
            timestamp: None,
            values: HashMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_value(mut self, working_data_id: ReferenceId, value: impl Into<RepresentationValue>) -> Self {
        self.values.insert(working_data_id, value.into());
        self
    }

    pub fn set_value(&mut self, working_data_id: ReferenceId, value: RepresentationValue) {
        self.values.insert(working_data_id, value);
    }

    /// Value logged for a sensor at this instant; `None` means no data this sample.
    pub fn meter_value(&self, working_data: &WorkingData) -> Option<&RepresentationValue> {
        self.values.get(&working_data.id)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}
