use super::ReferenceId;
use serde::{Deserialize, Serialize};

/// Data-integrity findings that do not abort processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A sensor reported a unit other than the first one seen in the pass.
    UnitInconsistency {
        working_data_id: ReferenceId,
        expected_unit: String,
        found_unit: String,
        occurrences: u64,
    },
    /// More than one zone covers a point with a rate for the same product.
    ZoneOverlapAmbiguity {
        product_id: ReferenceId,
        chosen_zone: usize,
        shadowed_zones: Vec<usize>,
    },
    /// A per-record product index pointed outside the operation's product list.
    ProductIndexOutOfRange {
        working_data_id: ReferenceId,
        index: i64,
        product_count: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnitInconsistency {
                working_data_id,
                expected_unit,
                found_unit,
                occurrences,
            } => write!(
                f,
                "working data {} reported {} value(s) in '{}', expected '{}'",
                working_data_id, occurrences, found_unit, expected_unit
            ),
            Diagnostic::ZoneOverlapAmbiguity {
                product_id,
                chosen_zone,
                shadowed_zones,
            } => write!(
                f,
                "product {} rated by overlapping zones; using zone {}, ignoring {:?}",
                product_id, chosen_zone, shadowed_zones
            ),
            Diagnostic::ProductIndexOutOfRange {
                working_data_id,
                index,
                product_count,
            } => write!(
                f,
                "working data {} reported product index {} but only {} product(s) are listed",
                working_data_id, index, product_count
            ),
        }
    }
}
