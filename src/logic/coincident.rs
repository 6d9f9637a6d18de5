use crate::models::{OperationData, ReferenceId};
use std::collections::{HashMap, HashSet};

/// Partition operations logged in the same pass into groups.
///
/// Coincidence is treated as undirected: a one-sided declaration links both
/// operations. Singletons are not emitted, and ids absent from `operations`
/// are ignored. Groups and their members follow input order.
pub fn group_coincident(operations: &[OperationData]) -> Vec<Vec<ReferenceId>> {
    let position: HashMap<ReferenceId, usize> = operations
        .iter()
        .enumerate()
        .map(|(i, op)| (op.id, i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); operations.len()];
    for (i, op) in operations.iter().enumerate() {
        for other in &op.coincident_operation_data_ids {
            if let Some(&j) = position.get(other) {
                if i != j {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }
    }

    let mut visited = vec![false; operations.len()];
    let mut groups = Vec::new();

    for start in 0..operations.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut component = vec![start];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    component.push(next);
                    stack.push(next);
                }
            }
        }

        if component.len() > 1 {
            component.sort_unstable();
            let mut seen = HashSet::new();
            groups.push(
                component
                    .into_iter()
                    .map(|i| operations[i].id)
                    .filter(|id| seen.insert(*id))
                    .collect(),
            );
        }
    }

    groups
}
