use crate::error::{FieldOpsError, Result};
use crate::models::{Catalog, DeviceElement, DeviceElementConfiguration, ReferenceId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Deepest walk allowed before the hierarchy is treated as cyclic.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// One element of a descendant walk, `depth` relative to the starting element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub element_id: ReferenceId,
    pub depth: usize,
    pub description: String,
}

/// Parent/child index over the catalog's device elements, built once per catalog.
pub struct DeviceHierarchy<'a> {
    catalog: &'a Catalog,
    elements: HashMap<ReferenceId, &'a DeviceElement>,
    children: HashMap<ReferenceId, Vec<ReferenceId>>,
    max_depth: usize,
}

impl<'a> DeviceHierarchy<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut elements = HashMap::new();
        let mut children: HashMap<ReferenceId, Vec<ReferenceId>> = HashMap::new();

        for element in &catalog.device_elements {
            elements.insert(element.id, element);
            if let Some(parent_id) = element.parent_id {
                children.entry(parent_id).or_default().push(element.id);
            }
        }

        Self {
            catalog,
            elements,
            children,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn element(&self, id: ReferenceId) -> Option<&'a DeviceElement> {
        self.elements.get(&id).copied()
    }

    /// Direct children in catalog order.
    pub fn children(&self, id: ReferenceId) -> &[ReferenceId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Elements without a parent, or whose parent is not in the catalog.
    pub fn roots(&self) -> Vec<ReferenceId> {
        self.catalog
            .device_elements
            .iter()
            .filter(|e| match e.parent_id {
                Some(parent) => !self.elements.contains_key(&parent),
                None => true,
            })
            .map(|e| e.id)
            .collect()
    }

    /// Depth-first walk from `root` (included at depth 0), siblings in catalog order.
    pub fn descendants(&self, root: ReferenceId) -> Result<Vec<HierarchyNode>> {
        let start = self
            .element(root)
            .ok_or_else(|| FieldOpsError::not_found("device element", root))?;

        let mut nodes = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(start.id, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) || depth > self.max_depth {
                return Err(FieldOpsError::HierarchyCycle { element_id: id });
            }

            let description = self
                .element(id)
                .map(|e| e.description.clone())
                .unwrap_or_default();
            nodes.push(HierarchyNode {
                element_id: id,
                depth,
                description,
            });

            for child in self.children(id).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }

        Ok(nodes)
    }

    /// Parent chain from the element's parent up to its root.
    pub fn ancestors(&self, id: ReferenceId) -> Result<Vec<ReferenceId>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = self
            .element(id)
            .ok_or_else(|| FieldOpsError::not_found("device element", id))?;

        while let Some(parent_id) = current.parent_id {
            if !visited.insert(parent_id) || chain.len() >= self.max_depth {
                return Err(FieldOpsError::HierarchyCycle {
                    element_id: parent_id,
                });
            }
            let Some(parent) = self.element(parent_id) else {
                break;
            };
            chain.push(parent_id);
            current = parent;
        }

        Ok(chain)
    }

    pub fn root_of(&self, id: ReferenceId) -> Result<ReferenceId> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    /// The element's bound configuration; `None` leaves a partial hierarchy for the caller.
    pub fn configuration_for(&self, id: ReferenceId) -> Option<&'a DeviceElementConfiguration> {
        self.catalog.configuration_for_element(id)
    }
}
