use super::{NumericRepresentationValue, ReferenceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceModel {
    pub id: ReferenceId,
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceElementType {
    Machine,
    Implement,
    Section,
    Unit,
    Bin,
    #[default]
    Other,
}

impl DeviceElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceElementType::Machine => "Machine",
            DeviceElementType::Implement => "Implement",
            DeviceElementType::Section => "Section",
            DeviceElementType::Unit => "Unit",
            DeviceElementType::Bin => "Bin",
            DeviceElementType::Other => "Other",
        }
    }
}

/// Node of the equipment hierarchy (tractor, planter, row, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceElement {
    pub id: ReferenceId,
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<ReferenceId>,
    pub device_model_id: ReferenceId,
    #[serde(default)]
    pub element_type: DeviceElementType,
}

/// Offset pair; x is inline (positive forward), y is lateral (positive right).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    #[serde(default)]
    pub x_offset: Option<NumericRepresentationValue>,
    #[serde(default)]
    pub y_offset: Option<NumericRepresentationValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfiguration {
    #[serde(default)]
    pub gps_receiver_x_offset: Option<NumericRepresentationValue>,
    #[serde(default)]
    pub gps_receiver_y_offset: Option<NumericRepresentationValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementConfiguration {
    #[serde(default)]
    pub physical_width: Option<NumericRepresentationValue>,
    /// Implement reference point relative to the vehicle hitch.
    #[serde(default)]
    pub control_point: Option<ReferencePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionConfiguration {
    #[serde(default)]
    pub section_width: Option<NumericRepresentationValue>,
    #[serde(default)]
    pub inline_offset: Option<NumericRepresentationValue>,
    #[serde(default)]
    pub lateral_offset: Option<NumericRepresentationValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConfigurationGeometry {
    Machine(MachineConfiguration),
    Implement(ImplementConfiguration),
    Section(SectionConfiguration),
}

impl ConfigurationGeometry {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationGeometry::Machine(_) => "Machine",
            ConfigurationGeometry::Implement(_) => "Implement",
            ConfigurationGeometry::Section(_) => "Section",
        }
    }
}

/// Physical properties of one device element for one configuration version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceElementConfiguration {
    pub id: ReferenceId,
    pub device_element_id: ReferenceId,
    pub description: String,
    #[serde(flatten)]
    pub geometry: ConfigurationGeometry,
}

impl DeviceElementConfiguration {
    pub fn as_machine(&self) -> Option<&MachineConfiguration> {
        match &self.geometry {
            ConfigurationGeometry::Machine(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_implement(&self) -> Option<&ImplementConfiguration> {
        match &self.geometry {
            ConfigurationGeometry::Implement(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionConfiguration> {
        match &self.geometry {
            ConfigurationGeometry::Section(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitchPoint {
    pub id: ReferenceId,
    #[serde(default)]
    pub reference_point: ReferencePoint,
    #[serde(default)]
    pub hitch_type: Option<String>,
}

/// Links a configuration to the hitch point it connects through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: ReferenceId,
    pub device_element_configuration_id: ReferenceId,
    pub hitch_point_id: ReferenceId,
}

/// A vehicle/implement pairing: connector 1 is the vehicle, connector 2 the implement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentConfiguration {
    pub id: ReferenceId,
    #[serde(default)]
    pub description: String,
    pub connector1_id: ReferenceId,
    pub connector2_id: ReferenceId,
}
