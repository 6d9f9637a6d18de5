use serde::{Deserialize, Serialize};

/// Integer id scoped to one loaded dataset. Monitor-generated ids are
/// usually negative, ids created by management software positive.
pub type ReferenceId = i32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId {
    pub id: String,
    pub source: String,
}

impl UniqueId {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Hands out reference ids for entities created in code.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: ReferenceId,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_at(first: ReferenceId) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> ReferenceId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
