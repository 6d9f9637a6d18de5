use crate::models::{ReferenceId, RepresentationKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldOpsError {
    #[error("Reference not found: {kind} {id}")]
    ReferenceNotFound { kind: &'static str, id: ReferenceId },

    #[error("Representation '{code}' is {expected} but the value is {found}")]
    RepresentationKindMismatch {
        code: String,
        expected: RepresentationKind,
        found: RepresentationKind,
    },

    #[error("Representation '{code}' got a non-finite value {value}")]
    NonFiniteValue { code: String, value: f64 },

    #[error("Device hierarchy cycle detected at element {element_id}")]
    HierarchyCycle { element_id: ReferenceId },

    #[error("Unknown {registry} code: {code}")]
    UnknownCode { registry: &'static str, code: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FieldOpsError {
    pub fn not_found(kind: &'static str, id: ReferenceId) -> Self {
        FieldOpsError::ReferenceNotFound { kind, id }
    }
}

pub type Result<T> = std::result::Result<T, FieldOpsError>;
