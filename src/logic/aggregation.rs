use super::working_data::{ProductReading, WorkingDataIndex};
use crate::datasources::SpatialRecordSource;
use crate::error::{FieldOpsError, Result};
use crate::models::{
    Diagnostic, OperationData, Point, ReferenceId, RepresentationValue, SpatialRecord,
    UnitOfMeasure, WorkingData,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Lat/lon bounds of the records seen in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Envelope {
    pub fn merge(self, other: Envelope) -> Envelope {
        Envelope {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude())
            && (self.min_lon..=self.max_lon).contains(&point.longitude())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvelopeAccumulator {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    points: u64,
}

impl Default for EnvelopeAccumulator {
    fn default() -> Self {
        Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            points: 0,
        }
    }
}

impl EnvelopeAccumulator {
    pub fn observe(&mut self, point: &Point) {
        self.min_lat = self.min_lat.min(point.latitude());
        self.max_lat = self.max_lat.max(point.latitude());
        self.min_lon = self.min_lon.min(point.longitude());
        self.max_lon = self.max_lon.max(point.longitude());
        self.points += 1;
    }

    /// `None` when no point was observed.
    pub fn finish(&self) -> Option<Envelope> {
        (self.points > 0).then_some(Envelope {
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lon: self.min_lon,
            max_lon: self.max_lon,
        })
    }
}

/// Running statistics for one numeric sensor. The unit is fixed by the first value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStatistics {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub unit: UnitOfMeasure,
}

impl NumericStatistics {
    pub fn first(value: f64, unit: UnitOfMeasure) -> Self {
        Self {
            count: 1,
            min: value,
            max: value,
            sum: value,
            mean: value,
            unit,
        }
    }

    /// Non-finite values are ignored.
    pub fn observe(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.mean = self.compute_mean();
    }

    // Bounded so rounding in the running sum cannot push the mean outside [min, max].
    fn compute_mean(&self) -> f64 {
        (self.sum / self.count as f64).max(self.min).min(self.max)
    }

    /// Combine two partial results. Statistics in a different unit are not
    /// mixed in; the number of values dropped is returned instead.
    pub fn merge(&mut self, other: &NumericStatistics) -> Option<u64> {
        if other.unit != self.unit {
            return Some(other.count);
        }
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.mean = self.compute_mean();
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberCount {
    pub member: String,
    pub count: u64,
}

/// Occurrences per declared member, in declaration order. Values outside the
/// declared members are counted separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumeratedStatistics {
    pub members: Vec<MemberCount>,
    pub undeclared: u64,
}

impl EnumeratedStatistics {
    pub fn new(members: &[String]) -> Self {
        Self {
            members: members
                .iter()
                .map(|m| MemberCount {
                    member: m.clone(),
                    count: 0,
                })
                .collect(),
            undeclared: 0,
        }
    }

    pub fn observe(&mut self, value: &str) {
        match self.members.iter_mut().find(|m| m.member == value) {
            Some(entry) => entry.count += 1,
            None => self.undeclared += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.members.iter().map(|m| m.count).sum::<u64>() + self.undeclared
    }

    pub fn count_of(&self, member: &str) -> Option<u64> {
        self.members
            .iter()
            .find(|m| m.member == member)
            .map(|m| m.count)
    }

    pub fn merge(&mut self, other: &EnumeratedStatistics) {
        for theirs in &other.members {
            match self.members.iter_mut().find(|m| m.member == theirs.member) {
                Some(ours) => ours.count += theirs.count,
                None => self.members.push(theirs.clone()),
            }
        }
        self.undeclared += other.undeclared;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorStatistics {
    Numeric(NumericStatistics),
    Enumerated(EnumeratedStatistics),
}

/// Statistics of one working data that reported at least one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub working_data_id: ReferenceId,
    pub device_configuration_id: Option<ReferenceId>,
    pub code: String,
    pub description: String,
    pub statistics: SensorStatistics,
}

impl SensorSummary {
    pub fn as_numeric(&self) -> Option<&NumericStatistics> {
        match &self.statistics {
            SensorStatistics::Numeric(n) => Some(n),
            SensorStatistics::Enumerated(_) => None,
        }
    }

    pub fn as_enumerated(&self) -> Option<&EnumeratedStatistics> {
        match &self.statistics {
            SensorStatistics::Enumerated(e) => Some(e),
            SensorStatistics::Numeric(_) => None,
        }
    }

    fn merge(&mut self, other: &SensorSummary, diagnostics: &mut Vec<Diagnostic>) {
        match (&mut self.statistics, &other.statistics) {
            (SensorStatistics::Numeric(ours), SensorStatistics::Numeric(theirs)) => {
                if let Some(dropped) = ours.merge(theirs) {
                    push_unit_inconsistency(
                        diagnostics,
                        self.working_data_id,
                        &ours.unit,
                        &theirs.unit,
                        dropped,
                    );
                }
            }
            (SensorStatistics::Enumerated(ours), SensorStatistics::Enumerated(theirs)) => {
                ours.merge(theirs)
            }
            _ => warn!(
                "Working data {} changed kind between blocks; keeping the first",
                self.working_data_id
            ),
        }
    }
}

fn push_unit_inconsistency(
    diagnostics: &mut Vec<Diagnostic>,
    working_data_id: ReferenceId,
    expected: &UnitOfMeasure,
    found: &UnitOfMeasure,
    occurrences: u64,
) {
    let diagnostic = Diagnostic::UnitInconsistency {
        working_data_id,
        expected_unit: expected.code.clone(),
        found_unit: found.code.clone(),
        occurrences,
    };
    warn!("{}", diagnostic);
    diagnostics.push(diagnostic);
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationResult {
    pub operation_data_ids: Vec<ReferenceId>,
    pub record_count: u64,
    pub envelope: Option<Envelope>,
    /// Sensors with at least one observation; sensors without data are omitted.
    pub sensors: Vec<SensorSummary>,
    /// Row-samples per product, from per-record product index readings.
    pub product_sample_counts: BTreeMap<ReferenceId, u64>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub first_record: Option<SpatialRecord>,
}

impl AggregationResult {
    pub fn sensor(&self, working_data_id: ReferenceId) -> Option<&SensorSummary> {
        self.sensors
            .iter()
            .find(|s| s.working_data_id == working_data_id)
    }

    /// Monoid combination of two partial results; `AggregationResult::default()` is the identity.
    pub fn merge(mut self, other: AggregationResult) -> AggregationResult {
        self.operation_data_ids.extend(other.operation_data_ids);
        self.record_count += other.record_count;
        self.envelope = match (self.envelope, other.envelope) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        };

        self.diagnostics.extend(other.diagnostics);
        for theirs in other.sensors {
            match self
                .sensors
                .iter_mut()
                .find(|s| s.working_data_id == theirs.working_data_id)
            {
                Some(ours) => ours.merge(&theirs, &mut self.diagnostics),
                None => self.sensors.push(theirs),
            }
        }

        for (product_id, count) in other.product_sample_counts {
            *self.product_sample_counts.entry(product_id).or_default() += count;
        }
        if self.first_record.is_none() {
            self.first_record = other.first_record;
        }
        self
    }
}

/// Single-pass accumulator over one operation's records.
pub struct SpatialAggregator<'i, 'a> {
    index: &'i WorkingDataIndex<'a>,
    working_datas: Vec<&'a WorkingData>,
    product_index: Vec<&'a WorkingData>,
    envelope: EnvelopeAccumulator,
    statistics: Vec<Option<SensorStatistics>>,
    unit_mismatches: BTreeMap<(ReferenceId, String), u64>,
    out_of_range: BTreeMap<(ReferenceId, i64), u64>,
    product_sample_counts: BTreeMap<ReferenceId, u64>,
    record_count: u64,
    first_record: Option<SpatialRecord>,
}

impl<'i, 'a> SpatialAggregator<'i, 'a> {
    pub fn new(index: &'i WorkingDataIndex<'a>, working_datas: &[&'a WorkingData]) -> Self {
        Self {
            index,
            working_datas: working_datas.to_vec(),
            product_index: index.product_index_working_datas(),
            envelope: EnvelopeAccumulator::default(),
            statistics: vec![None; working_datas.len()],
            unit_mismatches: BTreeMap::new(),
            out_of_range: BTreeMap::new(),
            product_sample_counts: BTreeMap::new(),
            record_count: 0,
            first_record: None,
        }
    }

    pub fn observe(&mut self, record: SpatialRecord) -> Result<()> {
        self.envelope.observe(&record.geometry);
        self.record_count += 1;

        for (slot, wd) in self.statistics.iter_mut().zip(&self.working_datas) {
            let Some(value) = record.meter_value(wd) else {
                continue;
            };
            if value.kind() != wd.kind() {
                return Err(FieldOpsError::RepresentationKindMismatch {
                    code: wd.representation.code().to_string(),
                    expected: wd.kind(),
                    found: value.kind(),
                });
            }

            match (slot.as_mut(), value) {
                (None, RepresentationValue::Numeric(v)) => {
                    *slot = Some(SensorStatistics::Numeric(NumericStatistics::first(
                        v.value(),
                        v.unit().clone(),
                    )));
                }
                (Some(SensorStatistics::Numeric(stats)), RepresentationValue::Numeric(v)) => {
                    if v.unit() == &stats.unit {
                        stats.observe(v.value());
                    } else {
                        *self
                            .unit_mismatches
                            .entry((wd.id, v.unit().code.clone()))
                            .or_default() += 1;
                    }
                }
                (None, RepresentationValue::Enumerated(v)) => {
                    let mut stats = EnumeratedStatistics::new(wd.representation.members());
                    stats.observe(v.value());
                    *slot = Some(SensorStatistics::Enumerated(stats));
                }
                (Some(SensorStatistics::Enumerated(stats)), RepresentationValue::Enumerated(v)) => {
                    stats.observe(v.value());
                }
                // Kinds were checked against the working data above.
                _ => {}
            }
        }

        for wd in &self.product_index {
            match self.index.product_for_record(wd, &record) {
                ProductReading::Product { product_id } => {
                    *self.product_sample_counts.entry(product_id).or_default() += 1;
                }
                ProductReading::OutOfRange { index } => {
                    *self.out_of_range.entry((wd.id, index)).or_default() += 1;
                }
                ProductReading::NoData => {}
            }
        }

        if self.first_record.is_none() {
            self.first_record = Some(record);
        }
        Ok(())
    }

    pub fn finish(self) -> AggregationResult {
        let mut diagnostics = Vec::new();

        for ((wd_id, found), occurrences) in &self.unit_mismatches {
            let expected = self
                .working_datas
                .iter()
                .zip(&self.statistics)
                .find(|(wd, _)| wd.id == *wd_id)
                .and_then(|(_, stats)| match stats {
                    Some(SensorStatistics::Numeric(n)) => Some(n.unit.clone()),
                    _ => None,
                });
            if let Some(expected) = expected {
                push_unit_inconsistency(
                    &mut diagnostics,
                    *wd_id,
                    &expected,
                    &UnitOfMeasure::new(found.clone()),
                    *occurrences,
                );
            }
        }

        let product_count = self.index.operation().product_ids.len();
        for (wd_id, index) in self.out_of_range.keys() {
            let diagnostic = Diagnostic::ProductIndexOutOfRange {
                working_data_id: *wd_id,
                index: *index,
                product_count,
            };
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        }

        let sensors = self
            .working_datas
            .iter()
            .zip(self.statistics)
            .filter_map(|(wd, stats)| {
                stats.map(|statistics| SensorSummary {
                    working_data_id: wd.id,
                    device_configuration_id: self.index.device_configuration_id(wd.id),
                    code: wd.representation.code().to_string(),
                    description: wd.representation.description().to_string(),
                    statistics,
                })
            })
            .collect();

        AggregationResult {
            operation_data_ids: vec![self.index.operation().id],
            record_count: self.record_count,
            envelope: self.envelope.finish(),
            sensors,
            product_sample_counts: self.product_sample_counts,
            diagnostics,
            first_record: self.first_record,
        }
    }
}

/// Consume `records` exactly once, accumulating statistics for `working_datas`.
pub fn aggregate<I>(
    index: &WorkingDataIndex<'_>,
    working_datas: &[&WorkingData],
    records: I,
) -> Result<AggregationResult>
where
    I: IntoIterator<Item = Result<SpatialRecord>>,
{
    let mut aggregator = SpatialAggregator::new(index, working_datas);
    for record in records {
        aggregator.observe(record?)?;
    }
    Ok(aggregator.finish())
}

/// Aggregate every working data of an operation, opening its record stream once.
pub fn aggregate_operation<S>(source: &S, operation: &OperationData) -> Result<AggregationResult>
where
    S: SpatialRecordSource + ?Sized,
{
    let index = WorkingDataIndex::build(operation);
    let working_datas = index.all_working_datas();
    let result = aggregate(&index, &working_datas, source.records(operation)?)?;
    debug!(
        "Aggregated operation data {}: {} records, {} sensors",
        operation.id,
        result.record_count,
        result.sensors.len()
    );
    Ok(result)
}

/// Aggregate independent operations in parallel. Each block is a sequential
/// pass; partial results are combined with `AggregationResult::merge`.
pub fn aggregate_blocks<S>(source: &S, operations: &[OperationData]) -> Result<AggregationResult>
where
    S: SpatialRecordSource + Sync + ?Sized,
{
    operations
        .par_iter()
        .map(|op| aggregate_operation(source, op))
        .try_reduce(AggregationResult::default, |a, b| Ok(a.merge(b)))
}
