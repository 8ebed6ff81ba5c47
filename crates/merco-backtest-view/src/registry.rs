/*
[INPUT]:  StreamEvent sequence (task records + connectivity transitions)
[OUTPUT]: Ordered, id-unique task collection and a connectivity flag
[POS]:    State layer - authoritative client view of known tasks
[UPDATE]: When merge rules or record validation change
*/

use std::collections::HashMap;

use merco_adapter::{BacktestTask, StreamEvent};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    /// Record broke the statistic/error invariants and was dropped
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    Tasks,
    Connectivity,
    Unchanged,
}

/// Tasks in first-seen order. An update replaces the whole record with the same id.
///
/// Disconnecting never clears tasks; they keep their last known state until the
/// stream resumes.
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: Vec<BacktestTask>,
    index: HashMap<String, usize>,
    connected: bool,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[BacktestTask] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&BacktestTask> {
        self.index.get(task_id).map(|&position| &self.tasks[position])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Returns whether the flag changed
    pub fn set_connected(&mut self, connected: bool) -> bool {
        let changed = self.connected != connected;
        self.connected = connected;
        changed
    }

    /// Completed tasks carrying a statistic, in registry order
    pub fn selectable(&self) -> impl Iterator<Item = &BacktestTask> {
        self.tasks.iter().filter(|task| task.is_selectable())
    }

    pub fn merge(&mut self, task: BacktestTask) -> MergeOutcome {
        if !task.is_consistent() {
            warn!(
                task_id = %task.id,
                status = ?task.status,
                has_statistic = task.statistic.is_some(),
                has_error = task.error_message.is_some(),
                "Dropping inconsistent task record"
            );
            return MergeOutcome::Rejected;
        }

        match self.index.get(&task.id) {
            Some(&position) => {
                debug!(task_id = %task.id, status = ?task.status, "Task record replaced");
                self.tasks[position] = task;
                MergeOutcome::Replaced
            }
            None => {
                debug!(task_id = %task.id, status = ?task.status, "Task record inserted");
                self.index.insert(task.id.clone(), self.tasks.len());
                self.tasks.push(task);
                MergeOutcome::Inserted
            }
        }
    }

    pub fn apply(&mut self, event: StreamEvent) -> RegistryChange {
        match event {
            StreamEvent::Task(task) => match self.merge(*task) {
                MergeOutcome::Rejected => RegistryChange::Unchanged,
                MergeOutcome::Inserted | MergeOutcome::Replaced => RegistryChange::Tasks,
            },
            StreamEvent::Connected => self.connectivity_change(true),
            StreamEvent::Disconnected => self.connectivity_change(false),
        }
    }

    fn connectivity_change(&mut self, connected: bool) -> RegistryChange {
        if self.set_connected(connected) {
            RegistryChange::Connectivity
        } else {
            RegistryChange::Unchanged
        }
    }
}
