//! Error types for dependency edits.
//!
//! Scheduling and conflict detection never fail; only edits to the
//! dependency graph can be rejected.

use thiserror::Error;

use crate::task::TaskId;

/// Adding `task_id -> dependency_id` would close a loop in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("adding dependency {task_id} -> {dependency_id} would create a circular dependency")]
pub struct CircularDependencyError {
    pub task_id: TaskId,
    pub dependency_id: TaskId,
}

/// Edit-time validation failures for a new dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("dependency task {dependency_id} does not exist")]
    UnknownTask { dependency_id: TaskId },

    #[error("task {task_id} cannot depend on itself")]
    SelfDependency { task_id: TaskId },

    #[error(transparent)]
    Circular(#[from] CircularDependencyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_error_names_both_tasks() {
        let err = CircularDependencyError {
            task_id: "b".to_string(),
            dependency_id: "a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("b -> a"));
        assert!(msg.contains("circular"));
    }

    #[test]
    fn dependency_error_wraps_circular_transparently() {
        let inner = CircularDependencyError {
            task_id: "x".to_string(),
            dependency_id: "y".to_string(),
        };
        let err: DependencyError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }
}
