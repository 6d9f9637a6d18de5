use super::{DateContext, OperationType, ReferenceId, RepresentationValue, TimeScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteredValue {
    pub value: RepresentationValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StampedMeteredValues {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Vec<MeteredValue>,
}

/// Totals for one product within a field operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub product_id: ReferenceId,
    #[serde(default)]
    pub operation_type: Option<OperationType>,
    #[serde(default)]
    pub data: Vec<StampedMeteredValues>,
}

/// Task-level totals, linked from `LoggedData::summary_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: ReferenceId,
    #[serde(default)]
    pub time_scopes: Vec<TimeScope>,
    #[serde(default)]
    pub summary_data: Vec<StampedMeteredValues>,
    #[serde(default)]
    pub operation_summaries: Vec<OperationSummary>,
}

impl Summary {
    /// Start and end of the operation; the end is carried as the second timestamp.
    pub fn actual_span(&self) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        let scope = self
            .time_scopes
            .iter()
            .find(|t| t.date_context == DateContext::ActualStart)?;
        Some((scope.timestamp1?, scope.timestamp2))
    }
}
