use super::{RecordStream, SpatialRecordSource};
use crate::error::Result;
use crate::models::{OperationData, ReferenceId, SpatialRecord};
use std::collections::HashMap;

/// Records held in memory, keyed by operation data id. Useful for data built in code.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: HashMap<ReferenceId, Vec<SpatialRecord>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, operation_data_id: ReferenceId, records: Vec<SpatialRecord>) -> Self {
        self.records
            .entry(operation_data_id)
            .or_default()
            .extend(records);
        self
    }
}

impl SpatialRecordSource for MemoryRecordSource {
    fn records(&self, operation: &OperationData) -> Result<RecordStream<'_>> {
        let records = self
            .records
            .get(&operation.id)
            .map(|r| r.as_slice())
            .unwrap_or_default();
        Ok(Box::new(records.iter().cloned().map(Ok)))
    }
}
