//! DependencyGraph: read-only view of "depends-on" edges over a task snapshot.
//!
//! Tasks are indexed by id and edges stay as id lists, so the graph never
//! owns pointers into itself. Every traversal is iterative with an explicit
//! visited set; already-cyclic input terminates instead of looping.
//!
//! Dangling ids (a dependency that is not in the snapshot) are never an
//! error. They count as unsatisfied for `can_start` and are skipped by the
//! traversals.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CircularDependencyError, DependencyError};
use crate::task::{Task, TaskId};

/// An edge that passed the cycle check.
///
/// `depends_on_task_ids` is the task's full dependency list with the new edge
/// applied; the caller persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAdded {
    pub task_id: TaskId,
    pub dependency_id: TaskId,
    pub depends_on_task_ids: Vec<TaskId>,
    /// The edge was already there; nothing changes.
    pub already_present: bool,
}

impl EdgeAdded {
    /// Write the updated dependency list into an in-memory snapshot.
    pub fn apply(&self, tasks: &mut [Task]) {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == self.task_id) {
            task.depends_on_task_ids = self.depends_on_task_ids.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// In-memory dependency graph keyed by task id.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    tasks: &'a [Task],
    /// id -> position in `tasks`. The first task wins on duplicate ids.
    index: HashMap<&'a str, usize>,
    /// id -> positions of tasks that list it as a direct dependency.
    dependents: HashMap<&'a str, Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(tasks.len());
        let mut dependents: HashMap<&'a str, Vec<usize>> = HashMap::new();

        for (i, task) in tasks.iter().enumerate() {
            index.entry(task.id.as_str()).or_insert(i);
            for dep in &task.depends_on_task_ids {
                let list = dependents.entry(dep.as_str()).or_default();
                // a repeated id in one dependency list is still one edge
                if list.last() != Some(&i) {
                    list.push(i);
                }
            }
        }

        Self {
            tasks,
            index,
            dependents,
        }
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&'a Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    /// True iff every dependency resolves to a done task.
    pub fn can_start(&self, task: &Task) -> bool {
        task.depends_on_task_ids
            .iter()
            .all(|dep| self.get(dep).is_some_and(|d| d.is_done))
    }

    /// Would `candidate_task_id -> new_dependency_id` close a loop?
    ///
    /// Walks from the new dependency along its own prerequisites and reports
    /// whether the candidate is reachable.
    pub fn would_create_cycle(&self, candidate_task_id: &str, new_dependency_id: &str) -> bool {
        if candidate_task_id == new_dependency_id {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![new_dependency_id];

        while let Some(id) = stack.pop() {
            if id == candidate_task_id {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(task) = self.get(id) else { continue };
            for dep in &task.depends_on_task_ids {
                if !visited.contains(dep.as_str()) {
                    stack.push(dep.as_str());
                }
            }
        }

        false
    }

    /// Cycle-checked edge addition. The graph itself is never mutated.
    pub fn try_add_dependency(
        &self,
        task_id: &str,
        new_dependency_id: &str,
    ) -> Result<EdgeAdded, CircularDependencyError> {
        if self.would_create_cycle(task_id, new_dependency_id) {
            debug!(task_id, new_dependency_id, "rejected circular dependency");
            return Err(CircularDependencyError {
                task_id: task_id.to_string(),
                dependency_id: new_dependency_id.to_string(),
            });
        }

        let mut deps = self
            .get(task_id)
            .map(|t| t.depends_on_task_ids.clone())
            .unwrap_or_default();
        let already_present = deps.iter().any(|d| d == new_dependency_id);
        if !already_present {
            deps.push(new_dependency_id.to_string());
        }

        Ok(EdgeAdded {
            task_id: task_id.to_string(),
            dependency_id: new_dependency_id.to_string(),
            depends_on_task_ids: deps,
            already_present,
        })
    }

    /// Edit-time validation: the dependency must exist, must not be the task
    /// itself, and must not close a cycle.
    pub fn validate_dependency(
        &self,
        task_id: &str,
        new_dependency_id: &str,
    ) -> Result<EdgeAdded, DependencyError> {
        if self.get(new_dependency_id).is_none() {
            return Err(DependencyError::UnknownTask {
                dependency_id: new_dependency_id.to_string(),
            });
        }
        if task_id == new_dependency_id {
            return Err(DependencyError::SelfDependency {
                task_id: task_id.to_string(),
            });
        }
        Ok(self.try_add_dependency(task_id, new_dependency_id)?)
    }

    /// Tasks that became startable because `just_completed_task_id` is done.
    ///
    /// Expects the post-completion snapshot.
    pub fn unlocked_tasks(&self, just_completed_task_id: &str) -> Vec<&'a Task> {
        self.direct_dependents(just_completed_task_id)
            .filter(|t| !t.is_done && self.can_start(t))
            .collect()
    }

    /// One user-facing line per unlocked task.
    pub fn unlock_notifications(&self, just_completed_task_id: &str) -> Vec<String> {
        self.unlocked_tasks(just_completed_task_id)
            .into_iter()
            .map(|t| format!("\"{}\" is now unlocked and ready to start", t.title))
            .collect()
    }

    /// The task followed by all of its transitive prerequisites, each once.
    pub fn dependency_chain(&self, task_id: &str) -> Vec<&'a Task> {
        let Some(&start) = self.index.get(task_id) else {
            return Vec::new();
        };

        let mut seen: HashSet<usize> = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![start];

        while let Some(i) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            let task = &self.tasks[i];
            out.push(task);
            // reversed so the first dependency is explored first
            for dep in task.depends_on_task_ids.iter().rev() {
                if let Some(&j) = self.index.get(dep.as_str()) {
                    if !seen.contains(&j) {
                        stack.push(j);
                    }
                }
            }
        }

        out
    }

    /// All tasks that depend on `task_id`, directly or transitively, each once.
    pub fn dependent_tasks(&self, task_id: &str) -> Vec<&'a Task> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<&str> = vec![task_id];

        while let Some(id) = stack.pop() {
            for &i in self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if seen.insert(i) {
                    let task = &self.tasks[i];
                    out.push(task);
                    stack.push(task.id.as_str());
                }
            }
        }

        out
    }

    /// Prerequisites before dependents; input order breaks ties.
    ///
    /// Edges that would revisit a task already on the current path (a cycle)
    /// or that point outside the snapshot are ignored.
    pub fn topological_order(&self) -> Vec<&'a Task> {
        let n = self.tasks.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut out = Vec::with_capacity(n);

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Visiting;
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = *frame;
                let deps = &self.tasks[node].depends_on_task_ids;
                if pos < deps.len() {
                    frame.1 += 1;
                    if let Some(&dep) = self.index.get(deps[pos].as_str()) {
                        if marks[dep] == Mark::Unvisited {
                            marks[dep] = Mark::Visiting;
                            stack.push((dep, 0));
                        }
                    }
                } else {
                    marks[node] = Mark::Done;
                    out.push(&self.tasks[node]);
                    stack.pop();
                }
            }
        }

        out
    }

    /// Ids of not-done tasks whose dependencies are not all done.
    pub fn blocked_task_ids(&self) -> BTreeSet<TaskId> {
        self.tasks
            .iter()
            .filter(|t| !t.is_done && !self.can_start(t))
            .map(|t| t.id.clone())
            .collect()
    }

    fn direct_dependents(&self, task_id: &str) -> impl Iterator<Item = &'a Task> + '_ {
        let tasks = self.tasks;
        self.dependents
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &tasks[i])
    }
}

/// True iff every dependency of `task` resolves to a done task in `all_tasks`.
pub fn can_start(task: &Task, all_tasks: &[Task]) -> bool {
    DependencyGraph::new(all_tasks).can_start(task)
}

pub fn would_create_cycle(candidate_task_id: &str, new_dependency_id: &str, all_tasks: &[Task]) -> bool {
    DependencyGraph::new(all_tasks).would_create_cycle(candidate_task_id, new_dependency_id)
}

pub fn try_add_dependency(
    task_id: &str,
    new_dependency_id: &str,
    all_tasks: &[Task],
) -> Result<EdgeAdded, CircularDependencyError> {
    DependencyGraph::new(all_tasks).try_add_dependency(task_id, new_dependency_id)
}

/// Owned copies of the tasks unlocked by completing `just_completed_task_id`.
pub fn unlocked_tasks(just_completed_task_id: &str, all_tasks: &[Task]) -> Vec<Task> {
    DependencyGraph::new(all_tasks)
        .unlocked_tasks(just_completed_task_id)
        .into_iter()
        .cloned()
        .collect()
}
