use super::{
    DataFrequency, ExportCollaborator, ImportCollaborator, ImportOptions, RecordStream,
    SpatialRecordSource,
};
use crate::error::{FieldOpsError, Result};
use crate::models::{
    Dataset, EnumeratedValue, NumericRepresentationValue, OperationData, Point, ReferenceId,
    Representation, SpatialRecord, UnitOfMeasure,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DATASET_FILE: &str = "dataset.json";
const RECORDS_DIR: &str = "records";

fn default_source_hz() -> u8 {
    5
}

/// On-disk envelope around a dataset.
#[derive(Debug, Serialize, Deserialize)]
struct DatasetFile {
    #[serde(default = "default_source_hz")]
    source_frequency_hz: u8,
    #[serde(flatten)]
    dataset: Dataset,
}

/// One line of a `records/<id>.jsonl` file.
#[derive(Debug, Deserialize)]
struct RecordLine {
    x: f64,
    y: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    values: HashMap<ReferenceId, WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Numeric { value: f64, unit: String },
    Enumerated(String),
}

/// Reference import/export collaborator over a directory of JSON files.
///
/// ```text
/// <dir>/dataset.json            catalog + documents
/// <dir>/records/<op id>.jsonl   one spatial record per line
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPlugin;

impl JsonPlugin {
    pub fn new() -> Self {
        Self
    }

    /// Load one dataset and the record source that streams its spatial records.
    pub fn open(&self, dir: &Path, options: &ImportOptions) -> Result<(Dataset, JsonRecordSource)> {
        let path = dir.join(DATASET_FILE);
        let file = File::open(&path).map_err(|e| {
            FieldOpsError::InvalidData(format!("cannot open {}: {}", path.display(), e))
        })?;
        let envelope: DatasetFile = serde_json::from_reader(BufReader::new(file))?;

        let source_frequency = DataFrequency::from_hz(envelope.source_frequency_hz).ok_or_else(|| {
            FieldOpsError::InvalidData(format!(
                "unsupported source frequency {} Hz",
                envelope.source_frequency_hz
            ))
        })?;

        let mut dataset = envelope.dataset;
        let dropped = filter_optional_sensors(&mut dataset, options);
        if dropped > 0 {
            debug!("Dropped {} working data in disabled sensor categories", dropped);
        }

        info!(
            "Loaded dataset from {} ({} logged data)",
            dir.display(),
            dataset.documents.logged_data.len()
        );

        let source = JsonRecordSource {
            dir: dir.join(RECORDS_DIR),
            step: decimation_step(source_frequency, options.data_frequency),
        };
        Ok((dataset, source))
    }
}

/// Records kept per record read: 1 Hz out of 5 Hz keeps every fifth.
fn decimation_step(source: DataFrequency, requested: DataFrequency) -> usize {
    if requested.hz() >= source.hz() {
        1
    } else {
        (source.hz() / requested.hz()) as usize
    }
}

fn filter_optional_sensors(dataset: &mut Dataset, options: &ImportOptions) -> usize {
    let mut dropped = 0;
    for logged in &mut dataset.documents.logged_data {
        for op in &mut logged.operation_data {
            for deu in &mut op.device_element_uses {
                let before = deu.working_datas.len();
                deu.working_datas
                    .retain(|wd| options.keeps_representation(wd.representation.code()));
                dropped += before - deu.working_datas.len();
            }
        }
    }
    dropped
}

impl ImportCollaborator for JsonPlugin {
    fn load(&self, path: &Path, options: &ImportOptions) -> Result<Vec<Dataset>> {
        let (dataset, _) = self.open(path, options)?;
        Ok(vec![dataset])
    }
}

impl ExportCollaborator for JsonPlugin {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let envelope = DatasetFile {
            source_frequency_hz: default_source_hz(),
            dataset: dataset.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        let target = path.join(DATASET_FILE);
        fs::write(&target, json)?;
        info!("Wrote dataset to {}", target.display());
        Ok(())
    }
}

/// Streams `records/<op id>.jsonl` one line at a time.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    dir: PathBuf,
    step: usize,
}

impl JsonRecordSource {
    /// Stream records from any reader. Values for unknown working data are skipped.
    /// With `step > 1` only every `step`-th line is kept, but unreadable lines
    /// always surface as errors whatever their position.
    pub fn stream<'a, R: Read + Send + 'a>(
        reader: R,
        operation: &OperationData,
        step: usize,
    ) -> RecordStream<'a> {
        let representations: HashMap<ReferenceId, Arc<Representation>> = operation
            .device_element_uses
            .iter()
            .flat_map(|deu| deu.working_datas.iter())
            .map(|wd| (wd.id, Arc::clone(&wd.representation)))
            .collect();

        let step = step.max(1);
        let lines = serde_json::Deserializer::from_reader(reader).into_iter::<RecordLine>();
        Box::new(
            lines
                .enumerate()
                .filter(move |(i, line)| line.is_err() || i % step == 0)
                .map(move |(_, line)| to_record(line?, &representations)),
        )
    }
}

impl SpatialRecordSource for JsonRecordSource {
    fn records(&self, operation: &OperationData) -> Result<RecordStream<'_>> {
        let path = self.dir.join(format!("{}.jsonl", operation.id));
        if !path.exists() {
            warn!("No record file for operation data {}", operation.id);
            return Ok(Box::new(std::iter::empty()));
        }
        let file = File::open(&path)?;
        Ok(Self::stream(BufReader::new(file), operation, self.step))
    }
}

fn to_record(
    line: RecordLine,
    representations: &HashMap<ReferenceId, Arc<Representation>>,
) -> Result<SpatialRecord> {
    let mut record = SpatialRecord::new(Point::new(line.x, line.y));
    record.timestamp = line.timestamp;

    for (wd_id, wire) in line.values {
        let Some(representation) = representations.get(&wd_id) else {
            continue;
        };
        let value = match wire {
            WireValue::Numeric { value, unit } => {
                NumericRepresentationValue::new(Arc::clone(representation), value, UnitOfMeasure::new(unit))?
                    .into()
            }
            WireValue::Enumerated(member) => {
                EnumeratedValue::new(Arc::clone(representation), member)?.into()
            }
        };
        record.set_value(wd_id, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::SensorCategory;
    use crate::models::{DeviceElementUse, LoggedData, OperationType, RepresentationValue, WorkingData};
    use std::io::Cursor;

    fn operation() -> OperationData {
        let mut op = OperationData::new(7, OperationType::SowingAndPlanting);
        op.max_depth = 0;
        op.device_element_uses.push(DeviceElementUse {
            id: 1,
            operation_data_id: 7,
            depth: 0,
            order: 0,
            device_configuration_id: 3,
            working_datas: vec![
                WorkingData {
                    id: 10,
                    device_element_use_id: 1,
                    representation: Arc::new(Representation::numeric("vrSeedRateSeedsActual", "Seed Rate")),
                },
                WorkingData {
                    id: 11,
                    device_element_use_id: 1,
                    representation: Arc::new(Representation::enumerated(
                        "dtRecordingStatus",
                        "Recording Status",
                        ["On", "Off"],
                    )),
                },
                WorkingData {
                    id: 12,
                    device_element_use_id: 1,
                    representation: Arc::new(Representation::numeric("vrDownForceMargin", "Downforce")),
                },
            ],
        });
        op
    }

    const LINES: &str = r#"
{"x": -89.1, "y": 40.1, "values": {"10": {"value": 32000.0, "unit": "seeds1ac-1"}, "11": "On"}}
{"x": -89.2, "y": 40.2, "values": {"10": {"value": 31000.0, "unit": "seeds1ac-1"}}}
{"x": -89.3, "y": 40.3, "values": {"99": "ignored"}}
{"x": -89.4, "y": 40.4, "values": {"11": "Off"}}
{"x": -89.5, "y": 40.5}
{"x": -89.6, "y": 40.6, "values": {"10": {"value": 30000.0, "unit": "seeds1ac-1"}}}
"#;

    #[test]
    fn streams_every_line() {
        let op = operation();
        let records: Vec<_> = JsonRecordSource::stream(Cursor::new(LINES), &op, 1)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].value_count(), 2);
        assert_eq!(records[2].value_count(), 0);
        assert_eq!(records[4].geometry.latitude(), 40.5);

        let wd = &op.device_element_uses[0].working_datas[1];
        assert!(matches!(
            records[3].meter_value(wd),
            Some(RepresentationValue::Enumerated(v)) if v.value() == "Off"
        ));
    }

    #[test]
    fn decimation_keeps_every_fifth_record() {
        assert_eq!(decimation_step(DataFrequency::FiveHz, DataFrequency::OneHz), 5);
        assert_eq!(decimation_step(DataFrequency::FiveHz, DataFrequency::FiveHz), 1);
        assert_eq!(decimation_step(DataFrequency::OneHz, DataFrequency::FiveHz), 1);

        let op = operation();
        let records: Vec<_> = JsonRecordSource::stream(Cursor::new(LINES), &op, 5)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].geometry.longitude(), -89.6);
    }

    #[test]
    fn decimation_surfaces_unreadable_skipped_lines() {
        let op = operation();
        let lines = r#"
{"x": 1.0, "y": 40.0}
{"x": "bad", "y": 40.0}
{"x": 3.0, "y": 40.0}
{"x": 4.0, "y": 40.0}
{"x": 5.0, "y": 40.0}
{"x": 6.0, "y": 40.0}
{"x": 7.0, "y": 40.0}
"#;
        let results: Vec<Result<SpatialRecord>> =
            JsonRecordSource::stream(Cursor::new(lines), &op, 5).collect();
        assert!(matches!(results.first(), Some(Ok(r)) if r.geometry.longitude() == 1.0));
        assert!(results.iter().any(|r| matches!(r, Err(FieldOpsError::Json(_)))));

        let collected: Result<Vec<_>> = JsonRecordSource::stream(Cursor::new(lines), &op, 5).collect();
        assert!(collected.is_err());
    }

    #[test]
    fn kind_mismatch_in_record_is_an_error() {
        let op = operation();
        let line = r#"{"x": 0.0, "y": 0.0, "values": {"11": {"value": 1.0, "unit": "count"}}}"#;
        let result: Result<Vec<_>> = JsonRecordSource::stream(Cursor::new(line), &op, 1).collect();
        assert!(matches!(result, Err(FieldOpsError::RepresentationKindMismatch { .. })));
    }

    #[test]
    fn disabled_categories_are_filtered_at_load() {
        let mut dataset = Dataset::default();
        dataset.documents.logged_data.push(LoggedData {
            id: 1,
            description: None,
            grower_id: None,
            farm_id: None,
            field_id: None,
            crop_zone_id: None,
            summary_id: None,
            operation_data: vec![operation()],
            equipment_configurations: Vec::new(),
        });

        let mut copy = dataset.clone();
        assert_eq!(filter_optional_sensors(&mut copy, &ImportOptions::default()), 1);
        let kept = &copy.documents.logged_data[0].operation_data[0].device_element_uses[0].working_datas;
        assert!(kept.iter().all(|wd| wd.id != 12));

        let mut options = ImportOptions::default();
        options.categories.insert(SensorCategory::Downforce);
        assert_eq!(filter_optional_sensors(&mut dataset, &options), 0);
    }

    #[test]
    fn write_then_open_roundtrips_the_catalog() {
        let dir = std::env::temp_dir().join(format!("fieldops-json-{}", std::process::id()));
        let mut dataset = Dataset::default();
        dataset.catalog.crops.push(crate::models::Crop {
            id: 1,
            name: "Corn".to_string(),
            unique_ids: Vec::new(),
        });

        JsonPlugin::new().write(&dataset, &dir).unwrap();
        let loaded = JsonPlugin::new().load(&dir, &ImportOptions::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].catalog.crops[0].name, "Corn");

        let _ = fs::remove_dir_all(&dir);
    }
}
