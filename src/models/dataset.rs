use super::{Catalog, LoggedData, ReferenceId, Summary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Documents {
    pub logged_data: Vec<LoggedData>,
    pub summaries: Vec<Summary>,
}

/// One wholly-contained dataset: static definitions plus logged operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub catalog: Catalog,
    pub documents: Documents,
}

impl Dataset {
    pub fn summary(&self, id: ReferenceId) -> Option<&Summary> {
        self.documents.summaries.iter().find(|s| s.id == id)
    }
}
