use crate::error::{FieldOpsError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepresentationKind {
    Numeric,
    Enumerated,
}

impl RepresentationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepresentationKind::Numeric => "numeric",
            RepresentationKind::Enumerated => "enumerated",
        }
    }
}

impl std::fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A measurement definition. Shared by reference across every value that uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Representation {
    Numeric {
        code: String,
        description: String,
    },
    Enumerated {
        code: String,
        description: String,
        /// Declared members, in order.
        members: Vec<String>,
    },
}

impl Representation {
    pub fn numeric(code: impl Into<String>, description: impl Into<String>) -> Self {
        Representation::Numeric {
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn enumerated<I, S>(code: impl Into<String>, description: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Representation::Enumerated {
            code: code.into(),
            description: description.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Representation::Numeric { code, .. } | Representation::Enumerated { code, .. } => code,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Representation::Numeric { description, .. }
            | Representation::Enumerated { description, .. } => description,
        }
    }

    pub fn kind(&self) -> RepresentationKind {
        match self {
            Representation::Numeric { .. } => RepresentationKind::Numeric,
            Representation::Enumerated { .. } => RepresentationKind::Enumerated,
        }
    }

    /// Declared enumeration members; empty for numeric representations.
    pub fn members(&self) -> &[String] {
        match self {
            Representation::Numeric { .. } => &[],
            Representation::Enumerated { members, .. } => members,
        }
    }

    fn expect_kind(&self, found: RepresentationKind) -> Result<()> {
        if self.kind() == found {
            Ok(())
        } else {
            Err(FieldOpsError::RepresentationKindMismatch {
                code: self.code().to_string(),
                expected: self.kind(),
                found,
            })
        }
    }
}

/// Unit codes take the form `unit[exp]unit[exp]`, e.g. `lb1ac-1` is pounds per acre.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitOfMeasure {
    pub code: String,
}

impl UnitOfMeasure {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl std::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericValue {
    pub value: f64,
    pub unit: UnitOfMeasure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNumeric", into = "RawNumeric")]
pub struct NumericRepresentationValue {
    representation: Arc<Representation>,
    value: NumericValue,
}

impl NumericRepresentationValue {
    pub fn new(representation: Arc<Representation>, value: f64, unit: UnitOfMeasure) -> Result<Self> {
        representation.expect_kind(RepresentationKind::Numeric)?;
        if !value.is_finite() {
            return Err(FieldOpsError::NonFiniteValue {
                code: representation.code().to_string(),
                value,
            });
        }
        Ok(Self {
            representation,
            value: NumericValue { value, unit },
        })
    }

    pub fn representation(&self) -> &Arc<Representation> {
        &self.representation
    }

    pub fn numeric_value(&self) -> &NumericValue {
        &self.value
    }

    pub fn value(&self) -> f64 {
        self.value.value
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.value.unit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnumerated", into = "RawEnumerated")]
pub struct EnumeratedValue {
    representation: Arc<Representation>,
    value: String,
}

impl EnumeratedValue {
    pub fn new(representation: Arc<Representation>, value: impl Into<String>) -> Result<Self> {
        representation.expect_kind(RepresentationKind::Enumerated)?;
        Ok(Self {
            representation,
            value: value.into(),
        })
    }

    pub fn representation(&self) -> &Arc<Representation> {
        &self.representation
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepresentationValue {
    Numeric(NumericRepresentationValue),
    Enumerated(EnumeratedValue),
}

impl RepresentationValue {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            RepresentationValue::Numeric(_) => RepresentationKind::Numeric,
            RepresentationValue::Enumerated(_) => RepresentationKind::Enumerated,
        }
    }

    pub fn representation(&self) -> &Arc<Representation> {
        match self {
            RepresentationValue::Numeric(v) => v.representation(),
            RepresentationValue::Enumerated(v) => v.representation(),
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericRepresentationValue> {
        match self {
            RepresentationValue::Numeric(v) => Some(v),
            RepresentationValue::Enumerated(_) => None,
        }
    }
}

impl From<NumericRepresentationValue> for RepresentationValue {
    fn from(value: NumericRepresentationValue) -> Self {
        RepresentationValue::Numeric(value)
    }
}

impl From<EnumeratedValue> for RepresentationValue {
    fn from(value: EnumeratedValue) -> Self {
        RepresentationValue::Enumerated(value)
    }
}

// Serialized forms. Deserializing goes through the checked constructors so a
// dataset file cannot smuggle in a value of the wrong kind.

#[derive(Serialize, Deserialize)]
struct RawNumeric {
    representation: Arc<Representation>,
    value: f64,
    unit: UnitOfMeasure,
}

impl TryFrom<RawNumeric> for NumericRepresentationValue {
    type Error = FieldOpsError;

    fn try_from(raw: RawNumeric) -> Result<Self> {
        NumericRepresentationValue::new(raw.representation, raw.value, raw.unit)
    }
}

impl From<NumericRepresentationValue> for RawNumeric {
    fn from(v: NumericRepresentationValue) -> Self {
        RawNumeric {
            representation: v.representation,
            value: v.value.value,
            unit: v.value.unit,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawEnumerated {
    representation: Arc<Representation>,
    value: String,
}

impl TryFrom<RawEnumerated> for EnumeratedValue {
    type Error = FieldOpsError;

    fn try_from(raw: RawEnumerated) -> Result<Self> {
        EnumeratedValue::new(raw.representation, raw.value)
    }
}

impl From<EnumeratedValue> for RawEnumerated {
    fn from(v: EnumeratedValue) -> Self {
        RawEnumerated {
            representation: v.representation,
            value: v.value,
        }
    }
}
