use super::{RepresentationRegistry, UnitRegistry};
use crate::error::{FieldOpsError, Result};
use crate::models::{Representation, UnitOfMeasure};
use std::collections::HashMap;
use std::sync::Arc;

const STANDARD_UNITS: &[&str] = &[
    "count", "ac", "ha", "m", "cm", "mm", "in", "ft", "lb", "kg", "gal", "l",
    "seeds1ac-1", "seeds1ha-1", "lb1ac-1", "kg1ha-1", "gal1ac-1", "l1ha-1",
    "mi1hr-1", "km1hr-1", "prcnt", "bu1ac-1", "C", "F",
];

const STANDARD_NUMERIC: &[(&str, &str)] = &[
    ("vrSeedRateSeedsTarget", "Seed Rate Target"),
    ("vrSeedRateSeedsActual", "Seed Rate Actual"),
    ("vrSeedDepthTarget", "Seed Depth Target"),
    ("vrSeedDepthActual", "Seed Depth Actual"),
    ("vrAppRateVolumeTarget", "Application Rate Volume Target"),
    ("vrAppRateVolumeActual", "Application Rate Volume Actual"),
    ("vrAppRateMassTarget", "Application Rate Mass Target"),
    ("vrAppRateMassActual", "Application Rate Mass Actual"),
    ("vrReportedFieldArea", "Reported Field Area"),
    ("vrTotalAreaCovered", "Total Area Covered"),
    ("vrVehicleSpeed", "Vehicle Speed"),
    ("vrYieldVolume", "Yield Volume"),
    ("vrHarvestMoisture", "Harvest Moisture"),
    ("vrProductIndex", "Product Index"),
    ("vrDownForceMargin", "Downforce Margin"),
    ("vrSingulationPercent", "Singulation"),
    ("vrEquipmentWidth", "Equipment Width"),
    ("vrInlineOffset", "Inline Offset"),
    ("vrLateralOffset", "Lateral Offset"),
];

const STANDARD_ENUMERATED: &[(&str, &str, &[&str])] = &[
    ("dtRecordingStatus", "Recording Status", &["On", "Off"]),
    ("dtSectionStatus", "Section Status", &["Enabled", "Disabled", "Error"]),
];

/// In-memory unit and representation registry.
#[derive(Debug, Clone, Default)]
pub struct StandardRegistry {
    units: HashMap<String, UnitOfMeasure>,
    representations: HashMap<String, Arc<Representation>>,
}

impl StandardRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the codes used in planting, application and harvest data.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for code in STANDARD_UNITS {
            registry.register_unit(UnitOfMeasure::new(*code));
        }
        for (code, description) in STANDARD_NUMERIC {
            registry.register_representation(Representation::numeric(*code, *description));
        }
        for (code, description, members) in STANDARD_ENUMERATED {
            registry.register_representation(Representation::enumerated(
                *code,
                *description,
                members.iter().copied(),
            ));
        }
        registry
    }

    pub fn register_unit(&mut self, unit: UnitOfMeasure) {
        self.units.insert(unit.code.clone(), unit);
    }

    pub fn register_representation(&mut self, representation: Representation) -> Arc<Representation> {
        let shared = Arc::new(representation);
        self.representations
            .insert(shared.code().to_string(), Arc::clone(&shared));
        shared
    }
}

impl UnitRegistry for StandardRegistry {
    fn resolve_unit(&self, code: &str) -> Result<UnitOfMeasure> {
        self.units
            .get(code)
            .cloned()
            .ok_or_else(|| FieldOpsError::UnknownCode {
                registry: "unit",
                code: code.to_string(),
            })
    }
}

impl RepresentationRegistry for StandardRegistry {
    fn resolve_representation(&self, code: &str) -> Result<Arc<Representation>> {
        self.representations
            .get(code)
            .cloned()
            .ok_or_else(|| FieldOpsError::UnknownCode {
                registry: "representation",
                code: code.to_string(),
            })
    }
}
