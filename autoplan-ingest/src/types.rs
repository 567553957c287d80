use std::collections::HashSet;

use anyhow::{Context, Result};
use autoplan_core::{BusyTimeBlock, Task};
use serde::{Deserialize, Serialize};

/// What a task repository hands the engine: every task plus any busy time
/// already known for the horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub busy: Vec<BusyTimeBlock>,
}

impl TaskSnapshot {
    /// Minimal invariants before the snapshot reaches the engine.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for t in &self.tasks {
            if t.id.trim().is_empty() {
                return Err(format!("task \"{}\" has an empty id", t.title));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(format!("duplicate task id: {}", t.id));
            }
            if t.depends_on_task_ids.iter().any(|d| d == &t.id) {
                return Err(format!("task {} depends on itself", t.id));
            }
            let mut deps = HashSet::new();
            if let Some(dup) = t.depends_on_task_ids.iter().find(|d| !deps.insert(d.as_str())) {
                return Err(format!("task {} lists dependency {} more than once", t.id, dup));
            }
            if t.estimated_minutes == Some(0) {
                return Err(format!("task {} has a zero estimate", t.id));
            }
        }
        Ok(())
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize snapshot")
    }
}

pub fn load_snapshot_json(json: &str) -> Result<TaskSnapshot> {
    let snapshot: TaskSnapshot = serde_json::from_str(json).context("parse task snapshot JSON")?;
    snapshot
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid task snapshot: {e}"))?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_defaults_to_empty() {
        let snap = load_snapshot_json(
            r#"{"tasks":[{"id":"a","title":"A","category":"school","priority":"low","createdAt":"2026-03-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(snap.tasks.len(), 1);
        assert!(snap.busy.is_empty());
        assert!(snap.task("a").is_some());
    }

    #[test]
    fn rejects_duplicate_ids_and_self_dependencies() {
        let mut snap = TaskSnapshot {
            tasks: vec![Task::new("a", "A"), Task::new("a", "Again")],
            busy: vec![],
        };
        assert!(snap.validate().unwrap_err().contains("duplicate"));

        snap.tasks = vec![Task::new("a", "A").depends_on("a")];
        assert!(snap.validate().unwrap_err().contains("itself"));

        let mut repeated = Task::new("a", "A");
        repeated.depends_on_task_ids = vec!["b".to_string(), "b".to_string()];
        snap.tasks = vec![repeated, Task::new("b", "B")];
        assert!(snap.validate().unwrap_err().contains("more than once"));
    }

    #[test]
    fn malformed_json_carries_context() {
        let err = load_snapshot_json("{ not json").unwrap_err();
        assert!(format!("{err:#}").contains("parse task snapshot JSON"));
    }
}
