pub mod json;
pub mod memory;
pub mod registry;

pub use json::{JsonPlugin, JsonRecordSource};
pub use memory::MemoryRecordSource;
pub use registry::StandardRegistry;

use crate::error::Result;
use crate::models::{Dataset, OperationData, Representation, SpatialRecord, UnitOfMeasure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Forward-only stream of records; a fresh call restarts the underlying read,
/// which is expensive and never done within one aggregation pass.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<SpatialRecord>> + Send + 'a>;

pub trait SpatialRecordSource {
    fn records(&self, operation: &OperationData) -> Result<RecordStream<'_>>;
}

pub trait ImportCollaborator {
    fn load(&self, path: &Path, options: &ImportOptions) -> Result<Vec<Dataset>>;
}

pub trait ExportCollaborator {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

pub trait UnitRegistry {
    fn resolve_unit(&self, code: &str) -> Result<UnitOfMeasure>;
}

pub trait RepresentationRegistry {
    fn resolve_representation(&self, code: &str) -> Result<Arc<Representation>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataFrequency {
    #[default]
    OneHz,
    FiveHz,
}

impl DataFrequency {
    pub fn hz(&self) -> u8 {
        match self {
            DataFrequency::OneHz => 1,
            DataFrequency::FiveHz => 5,
        }
    }

    pub fn from_hz(hz: u8) -> Option<Self> {
        match hz {
            1 => Some(DataFrequency::OneHz),
            5 => Some(DataFrequency::FiveHz),
            _ => None,
        }
    }
}

/// Optional sensor groups that are dropped at import unless enabled.
///
/// Application-rate sensors are optional too: `vrAppRateMass*` readings
/// (insecticide) fall under `GranularApplication` and `vrAppRateVolume*` readings
/// (starter) under `LiquidApplication`, so a default import drops them.
/// Target-rate codes used by prescriptions are classified the same way, but
/// prescriptions are never filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorCategory {
    Downforce,
    SeedingQuality,
    SoilSensing,
    GranularApplication,
    LiquidApplication,
    RowUnitDepthControl,
    RowUnitClosingSystem,
    RowTotals,
    RowCleanerSystem,
}

// Matched against the lower-cased representation code, first hit wins.
const CATEGORY_KEYWORDS: &[(&str, SensorCategory)] = &[
    ("rowcleaner", SensorCategory::RowCleanerSystem),
    ("closing", SensorCategory::RowUnitClosingSystem),
    ("depthcontrol", SensorCategory::RowUnitDepthControl),
    ("rowunitdepth", SensorCategory::RowUnitDepthControl),
    ("rowtotal", SensorCategory::RowTotals),
    ("downforce", SensorCategory::Downforce),
    ("groundcontact", SensorCategory::Downforce),
    ("singulation", SensorCategory::SeedingQuality),
    ("skip", SensorCategory::SeedingQuality),
    ("double", SensorCategory::SeedingQuality),
    ("spacing", SensorCategory::SeedingQuality),
    ("ridequality", SensorCategory::SeedingQuality),
    ("soiltemp", SensorCategory::SoilSensing),
    ("moisture", SensorCategory::SoilSensing),
    ("organicmatter", SensorCategory::SoilSensing),
    ("furrow", SensorCategory::SoilSensing),
    ("insecticide", SensorCategory::GranularApplication),
    ("granular", SensorCategory::GranularApplication),
    ("appratemass", SensorCategory::GranularApplication),
    ("liquid", SensorCategory::LiquidApplication),
    ("appratevolume", SensorCategory::LiquidApplication),
];

impl SensorCategory {
    pub fn all() -> &'static [SensorCategory] {
        &[
            SensorCategory::Downforce,
            SensorCategory::SeedingQuality,
            SensorCategory::SoilSensing,
            SensorCategory::GranularApplication,
            SensorCategory::LiquidApplication,
            SensorCategory::RowUnitDepthControl,
            SensorCategory::RowUnitClosingSystem,
            SensorCategory::RowTotals,
            SensorCategory::RowCleanerSystem,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorCategory::Downforce => "Downforce",
            SensorCategory::SeedingQuality => "SeedingQuality",
            SensorCategory::SoilSensing => "SoilSensing",
            SensorCategory::GranularApplication => "GranularApplication",
            SensorCategory::LiquidApplication => "LiquidApplication",
            SensorCategory::RowUnitDepthControl => "RowUnitDepthControl",
            SensorCategory::RowUnitClosingSystem => "RowUnitClosingSystem",
            SensorCategory::RowTotals => "RowTotals",
            SensorCategory::RowCleanerSystem => "RowCleanerSystem",
        }
    }

    /// Category of an optional sensor, `None` for core sensors that are always kept.
    pub fn for_representation_code(code: &str) -> Option<Self> {
        let code = code.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(keyword, _)| code.contains(keyword))
            .map(|(_, category)| *category)
    }
}

impl std::fmt::Display for SensorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub data_frequency: DataFrequency,
    pub categories: BTreeSet<SensorCategory>,
}

impl ImportOptions {
    pub fn with_all_categories(mut self) -> Self {
        self.categories.extend(SensorCategory::all().iter().copied());
        self
    }

    pub fn includes(&self, category: SensorCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Whether a sensor with this representation code survives import.
    pub fn keeps_representation(&self, code: &str) -> bool {
        match SensorCategory::for_representation_code(code) {
            Some(category) => self.includes(category),
            None => true,
        }
    }
}
