use super::hierarchy::{DeviceHierarchy, HierarchyNode};
use crate::error::Result;
use crate::models::{
    Catalog, DeviceElementConfiguration, EquipmentConfiguration, HitchPoint,
    NumericRepresentationValue, ReferenceId,
};
use serde::Serialize;
use tracing::warn;

const VEHICLE_REFERENCE: &str = "tractor reference point (center of rear axle)";
const IMPLEMENT_REFERENCE: &str = "implement reference point (center of implement)";
const HITCH_REFERENCE: &str = "tractor hitch point";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InlineDirection {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LateralDirection {
    Right,
    Left,
}

/// A measured quantity as reported, `value` in `unit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub value: f64,
    pub unit: String,
}

impl From<&NumericRepresentationValue> for Measure {
    fn from(v: &NumericRepresentationValue) -> Self {
        Measure {
            value: v.value(),
            unit: v.unit().code.clone(),
        }
    }
}

/// Position of a point relative to a reference point. Distances are magnitudes;
/// positive x is in front, positive y is to the right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offset {
    pub label: String,
    pub reference: String,
    pub inline: Measure,
    pub inline_direction: InlineDirection,
    pub lateral: Measure,
    pub lateral_direction: LateralDirection,
}

impl Offset {
    pub fn new(
        label: impl Into<String>,
        reference: impl Into<String>,
        x: &NumericRepresentationValue,
        y: &NumericRepresentationValue,
    ) -> Self {
        let inline_direction = if x.value() >= 0.0 {
            InlineDirection::Front
        } else {
            InlineDirection::Back
        };
        let lateral_direction = if y.value() >= 0.0 {
            LateralDirection::Right
        } else {
            LateralDirection::Left
        };
        Offset {
            label: label.into(),
            reference: reference.into(),
            inline: Measure {
                value: x.value().abs(),
                unit: x.unit().code.clone(),
            },
            inline_direction,
            lateral: Measure {
                value: y.value().abs(),
                unit: y.unit().code.clone(),
            },
            lateral_direction,
        }
    }

    fn optional(
        label: &str,
        reference: &str,
        x: Option<&NumericRepresentationValue>,
        y: Option<&NumericRepresentationValue>,
    ) -> Option<Self> {
        match (x, y) {
            (Some(x), Some(y)) => Some(Offset::new(label, reference, x, y)),
            _ => {
                warn!("No {} offset recorded", label);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Width {
    pub description: String,
    pub width: Measure,
}

/// The vehicle and implement joined by an equipment configuration.
/// Connector 1 is the vehicle side, connector 2 the implement side.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentLayout<'a> {
    pub equipment: &'a EquipmentConfiguration,
    pub vehicle: Option<&'a DeviceElementConfiguration>,
    pub implement: Option<&'a DeviceElementConfiguration>,
    pub vehicle_hitch: Option<&'a HitchPoint>,
    pub implement_hitch: Option<&'a HitchPoint>,
}

impl<'a> EquipmentLayout<'a> {
    pub fn resolve(catalog: &'a Catalog, equipment: &'a EquipmentConfiguration) -> Self {
        let side = |connector_id: ReferenceId| {
            let Some(connector) = catalog.connector(connector_id) else {
                warn!("Connector {} not found", connector_id);
                return (None, None);
            };
            (
                catalog.configuration(connector.device_element_configuration_id),
                catalog.hitch_point(connector.hitch_point_id),
            )
        };
        let (vehicle, vehicle_hitch) = side(equipment.connector1_id);
        let (implement, implement_hitch) = side(equipment.connector2_id);

        Self {
            equipment,
            vehicle,
            implement,
            vehicle_hitch,
            implement_hitch,
        }
    }
}

/// Structure, widths and offsets of one equipment configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub equipment_configuration_id: ReferenceId,
    pub vehicle_hierarchy: Vec<HierarchyNode>,
    pub implement_hierarchy: Vec<HierarchyNode>,
    pub widths: Vec<Width>,
    pub offsets: Vec<Offset>,
}

impl EquipmentSummary {
    /// Missing connectors, configurations or hitch points leave gaps; a cyclic
    /// hierarchy is an error.
    pub fn build(hierarchy: &DeviceHierarchy<'_>, layout: &EquipmentLayout<'_>) -> Result<Self> {
        let vehicle_hierarchy = match layout.vehicle {
            Some(v) => hierarchy.descendants(v.device_element_id)?,
            None => Vec::new(),
        };
        let implement_hierarchy = match layout.implement {
            Some(i) => hierarchy.descendants(i.device_element_id)?,
            None => Vec::new(),
        };

        let sections: Vec<(&HierarchyNode, &DeviceElementConfiguration)> = implement_hierarchy
            .iter()
            .skip(1)
            .filter_map(|node| {
                hierarchy
                    .configuration_for(node.element_id)
                    .filter(|c| c.as_section().is_some())
                    .map(|c| (node, c))
            })
            .collect();

        let mut widths = Vec::new();
        if let Some(implement) = layout.implement {
            match implement.as_implement().and_then(|i| i.physical_width.as_ref()) {
                Some(width) => widths.push(Width {
                    description: implement.description.clone(),
                    width: width.into(),
                }),
                None => warn!("Implement {} has no physical width", implement.description),
            }
        }
        for (_, config) in &sections {
            if let Some(width) = config.as_section().and_then(|s| s.section_width.as_ref()) {
                widths.push(Width {
                    description: config.description.clone(),
                    width: width.into(),
                });
            }
        }

        let mut offsets = Vec::new();
        if let Some(machine) = layout.vehicle.and_then(|v| v.as_machine()) {
            offsets.extend(Offset::optional(
                "GPS receiver",
                VEHICLE_REFERENCE,
                machine.gps_receiver_x_offset.as_ref(),
                machine.gps_receiver_y_offset.as_ref(),
            ));
        }
        if let Some(hitch) = layout.vehicle_hitch {
            offsets.extend(Offset::optional(
                "vehicle hitch point",
                VEHICLE_REFERENCE,
                hitch.reference_point.x_offset.as_ref(),
                hitch.reference_point.y_offset.as_ref(),
            ));
        }
        if let Some(hitch) = layout.implement_hitch {
            offsets.extend(Offset::optional(
                "implement hitch point",
                IMPLEMENT_REFERENCE,
                hitch.reference_point.x_offset.as_ref(),
                hitch.reference_point.y_offset.as_ref(),
            ));
        }
        if let Some(control) = layout
            .implement
            .and_then(|i| i.as_implement())
            .and_then(|i| i.control_point.as_ref())
        {
            offsets.extend(Offset::optional(
                "implement control point",
                HITCH_REFERENCE,
                control.x_offset.as_ref(),
                control.y_offset.as_ref(),
            ));
        }
        for (node, config) in &sections {
            if let Some(section) = config.as_section() {
                offsets.extend(Offset::optional(
                    &format!("{} offset", node.description),
                    HITCH_REFERENCE,
                    section.inline_offset.as_ref(),
                    section.lateral_offset.as_ref(),
                ));
            }
        }

        Ok(Self {
            equipment_configuration_id: layout.equipment.id,
            vehicle_hierarchy,
            implement_hierarchy,
            widths,
            offsets,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{
        ConfigurationGeometry, Connector, DeviceElement, DeviceElementType, ImplementConfiguration,
        MachineConfiguration, ReferencePoint, Representation, SectionConfiguration,
        UnitOfMeasure,
    };
    use std::sync::Arc;

    fn length(value: f64, unit: &str) -> NumericRepresentationValue {
        NumericRepresentationValue::new(
            Arc::new(Representation::numeric("vrEquipmentWidth", "Length")),
            value,
            UnitOfMeasure::new(unit),
        )
        .unwrap()
    }

    fn element(id: ReferenceId, parent: Option<ReferenceId>, description: &str, kind: DeviceElementType) -> DeviceElement {
        DeviceElement {
            id,
            description: description.to_string(),
            parent_id: parent,
            device_model_id: 1,
            element_type: kind,
        }
    }

    fn configuration(id: ReferenceId, element: ReferenceId, description: &str, geometry: ConfigurationGeometry) -> DeviceElementConfiguration {
        DeviceElementConfiguration {
            id,
            device_element_id: element,
            description: description.to_string(),
            geometry,
        }
    }

    fn section(inline: f64, lateral: f64) -> ConfigurationGeometry {
        ConfigurationGeometry::Section(SectionConfiguration {
            section_width: Some(length(76.2, "cm")),
            inline_offset: Some(length(inline, "m")),
            lateral_offset: Some(length(lateral, "m")),
        })
    }

    /// Tractor hitched to a two-row planter.
    pub(crate) fn tractor_and_planter() -> (Catalog, EquipmentConfiguration) {
        let catalog = Catalog {
            device_elements: vec![
                element(1, None, "Tractor", DeviceElementType::Machine),
                element(2, None, "Planter", DeviceElementType::Implement),
                element(3, Some(2), "Row 1", DeviceElementType::Section),
                element(4, Some(2), "Row 2", DeviceElementType::Section),
            ],
            device_element_configurations: vec![
                configuration(
                    11,
                    1,
                    "Tractor",
                    ConfigurationGeometry::Machine(MachineConfiguration {
                        gps_receiver_x_offset: Some(length(1.5, "m")),
                        gps_receiver_y_offset: Some(length(0.0, "m")),
                    }),
                ),
                configuration(
                    12,
                    2,
                    "Planter",
                    ConfigurationGeometry::Implement(ImplementConfiguration {
                        physical_width: Some(length(1.524, "m")),
                        control_point: Some(ReferencePoint {
                            x_offset: Some(length(-2.0, "m")),
                            y_offset: Some(length(0.0, "m")),
                        }),
                    }),
                ),
                configuration(13, 3, "Row 1", section(-2.5, -0.381)),
                configuration(14, 4, "Row 2", section(-2.5, 0.381)),
            ],
            connectors: vec![
                Connector {
                    id: 21,
                    device_element_configuration_id: 11,
                    hitch_point_id: 31,
                },
                Connector {
                    id: 22,
                    device_element_configuration_id: 12,
                    hitch_point_id: 32,
                },
            ],
            hitch_points: vec![
                HitchPoint {
                    id: 31,
                    reference_point: ReferencePoint {
                        x_offset: Some(length(-1.2, "m")),
                        y_offset: Some(length(0.0, "m")),
                    },
                    hitch_type: None,
                },
                HitchPoint {
                    id: 32,
                    reference_point: ReferencePoint {
                        x_offset: Some(length(2.0, "m")),
                        y_offset: Some(length(0.0, "m")),
                    },
                    hitch_type: None,
                },
            ],
            ..Default::default()
        };
        let equipment = EquipmentConfiguration {
            id: 40,
            description: "Tractor + Planter".to_string(),
            connector1_id: 21,
            connector2_id: 22,
        };
        (catalog, equipment)
    }

    #[test]
    fn offsets_report_magnitude_and_direction() {
        let offset = Offset::new("row", HITCH_REFERENCE, &length(-2.5, "m"), &length(-0.381, "m"));
        assert_eq!(offset.inline.value, 2.5);
        assert_eq!(offset.inline_direction, InlineDirection::Back);
        assert_eq!(offset.lateral.value, 0.381);
        assert_eq!(offset.lateral_direction, LateralDirection::Left);

        let zero = Offset::new("gps", VEHICLE_REFERENCE, &length(0.0, "m"), &length(0.0, "m"));
        assert_eq!(zero.inline_direction, InlineDirection::Front);
        assert_eq!(zero.lateral_direction, LateralDirection::Right);
    }

    #[test]
    fn layout_resolves_both_connectors() {
        let (catalog, equipment) = tractor_and_planter();
        let layout = EquipmentLayout::resolve(&catalog, &equipment);
        assert_eq!(layout.vehicle.map(|c| c.id), Some(11));
        assert_eq!(layout.implement.map(|c| c.id), Some(12));
        assert_eq!(layout.implement_hitch.map(|h| h.id), Some(32));
    }

    #[test]
    fn summary_lists_hierarchies_widths_and_offsets() {
        let (catalog, equipment) = tractor_and_planter();
        let hierarchy = DeviceHierarchy::new(&catalog);
        let layout = EquipmentLayout::resolve(&catalog, &equipment);
        let summary = EquipmentSummary::build(&hierarchy, &layout).unwrap();

        assert_eq!(summary.vehicle_hierarchy.len(), 1);
        let rows: Vec<_> = summary
            .implement_hierarchy
            .iter()
            .map(|n| (n.description.as_str(), n.depth))
            .collect();
        assert_eq!(rows, vec![("Planter", 0), ("Row 1", 1), ("Row 2", 1)]);

        let widths: Vec<_> = summary.widths.iter().map(|w| w.description.as_str()).collect();
        assert_eq!(widths, vec!["Planter", "Row 1", "Row 2"]);

        let labels: Vec<_> = summary.offsets.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "GPS receiver",
                "vehicle hitch point",
                "implement hitch point",
                "implement control point",
                "Row 1 offset",
                "Row 2 offset",
            ]
        );
        assert_eq!(summary.offsets[5].lateral_direction, LateralDirection::Right);
    }

    #[test]
    fn missing_connector_leaves_gaps() {
        let (catalog, mut equipment) = tractor_and_planter();
        equipment.connector2_id = 99;
        let hierarchy = DeviceHierarchy::new(&catalog);
        let layout = EquipmentLayout::resolve(&catalog, &equipment);
        assert!(layout.implement.is_none());

        let summary = EquipmentSummary::build(&hierarchy, &layout).unwrap();
        assert!(summary.implement_hierarchy.is_empty());
        assert!(summary.widths.is_empty());
        assert_eq!(summary.offsets.len(), 2);
    }
}
