//! Dependency set validation.
//!
//! A proposed set is rejected when it references the task itself, when one of
//! the referenced tasks already depends on the task (a direct cycle), or when
//! the task is reachable from any referenced task through longer chains.

use std::collections::{HashMap, HashSet, VecDeque};

use db::models::task_dependency::TaskDependency;
use sqlx::SqliteConnection;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyViolation {
    #[error("Task cannot depend on itself")]
    SelfReference,
    #[error("Direct circular dependency detected with task {0}")]
    DirectCycle(Uuid),
    #[error("Circular dependency detected: {}", format_path(.0))]
    Cycle(Vec<Uuid>),
}

impl DependencyViolation {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            DependencyViolation::SelfReference => "self",
            DependencyViolation::DirectCycle(_) => "direct-cycle",
            DependencyViolation::Cycle(_) => "cycle",
        }
    }
}

fn format_path(path: &[Uuid]) -> String {
    path.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Collapses duplicates, keeping the first occurrence of each id.
pub fn normalize(proposed: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(proposed.len());
    proposed
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Adjacency list of stored dependency edges (task -> tasks it depends on).
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    edges: HashMap<Uuid, Vec<Uuid>>,
}

impl DependencyGraph {
    pub fn from_edges(edges: impl IntoIterator<Item = (Uuid, Uuid)>) -> Self {
        let mut graph = DependencyGraph::default();
        for (task_id, depends_on_id) in edges {
            graph.edges.entry(task_id).or_default().push(depends_on_id);
        }
        graph
    }

    pub async fn load(conn: &mut SqliteConnection) -> Result<Self, sqlx::Error> {
        let edges = TaskDependency::find_all(conn).await?;
        Ok(Self::from_edges(
            edges.into_iter().map(|edge| (edge.task_id, edge.depends_on_id)),
        ))
    }

    fn dependencies_of(&self, task_id: Uuid) -> &[Uuid] {
        self.edges.get(&task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Checks whether `task_id` may depend on every task in `proposed`,
    /// assuming `proposed` replaces the task's current dependency set.
    pub fn validate(&self, task_id: Uuid, proposed: &[Uuid]) -> Result<(), DependencyViolation> {
        if proposed.contains(&task_id) {
            return Err(DependencyViolation::SelfReference);
        }

        if let Some(offender) = proposed
            .iter()
            .find(|dep| self.dependencies_of(**dep).contains(&task_id))
        {
            return Err(DependencyViolation::DirectCycle(*offender));
        }

        for dep in proposed {
            if let Some(path) = self.path_between(*dep, task_id) {
                let mut cycle = Vec::with_capacity(path.len() + 1);
                cycle.push(task_id);
                cycle.extend(path);
                return Err(DependencyViolation::Cycle(cycle));
            }
        }

        Ok(())
    }

    /// Breadth-first search for a chain `from -> ... -> to`.
    fn path_between(&self, from: Uuid, to: Uuid) -> Option<Vec<Uuid>> {
        let mut parents: HashMap<Uuid, Uuid> = HashMap::new();
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            // The target's own outgoing edges are about to be replaced.
            if node == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(parent) = parents.get(&current) {
                    path.push(*parent);
                    current = *parent;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.dependencies_of(node) {
                if visited.insert(*next) {
                    parents.insert(*next, node);
                    queue.push_back(*next);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn normalize_drops_duplicates_and_keeps_order() {
        let t = ids(3);
        let proposed = vec![t[1], t[0], t[1], t[2], t[0]];
        assert_eq!(normalize(&proposed), vec![t[1], t[0], t[2]]);
    }

    #[test]
    fn self_reference_is_rejected_first() {
        let t = ids(2);
        let graph = DependencyGraph::from_edges([(t[1], t[0])]);
        assert_eq!(
            graph.validate(t[0], &[t[1], t[0]]),
            Err(DependencyViolation::SelfReference)
        );
    }

    #[test]
    fn direct_cycle_is_reported_with_offender() {
        let t = ids(2);
        let graph = DependencyGraph::from_edges([(t[1], t[0])]);
        let err = graph.validate(t[0], &[t[1]]).unwrap_err();
        assert_eq!(err, DependencyViolation::DirectCycle(t[1]));
        assert_eq!(err.reason(), "direct-cycle");
    }

    #[test]
    fn longer_cycles_are_detected() {
        // a -> b -> c already stored; c -> a would close the loop.
        let t = ids(3);
        let (a, b, c) = (t[0], t[1], t[2]);
        let graph = DependencyGraph::from_edges([(a, b), (b, c)]);
        let err = graph.validate(c, &[a]).unwrap_err();
        assert_eq!(err.reason(), "cycle");
        assert_eq!(err, DependencyViolation::Cycle(vec![c, a, b, c]));
    }

    #[test]
    fn replacing_existing_edges_is_not_a_cycle() {
        let t = ids(3);
        let (a, b, c) = (t[0], t[1], t[2]);
        let graph = DependencyGraph::from_edges([(a, b), (c, b)]);
        assert!(graph.validate(a, &[b, c]).is_ok());
        assert!(graph.validate(a, &[]).is_ok());
    }

    #[test]
    fn diamond_shapes_are_allowed() {
        let t = ids(4);
        let (a, b, c, d) = (t[0], t[1], t[2], t[3]);
        let graph = DependencyGraph::from_edges([(b, d), (c, d)]);
        assert!(graph.validate(a, &[b, c]).is_ok());
    }
}
