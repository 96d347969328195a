use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use indexmap::IndexSet;
use log::warn;

use crate::error::{ExecutionError, ExecutionResult};
use crate::executor::ExecutorRepresenter;
use crate::id::{ExecutorId, TaskGroupId};
use crate::task_group::{ContainerType, ScheduledTaskGroup};

/// An in-process executor representer.
///
/// The running set lives behind its own mutex so the representer can be
/// shared between the container manager and the scheduling policy cache.
/// The scheduling policy serializes all mutations under its global lock.
pub struct LocalExecutorRepresenter {
    executor_id: ExecutorId,
    container_type: ContainerType,
    capacity: usize,
    running_task_groups: Mutex<IndexSet<TaskGroupId>>,
}

impl LocalExecutorRepresenter {
    pub fn new(
        executor_id: ExecutorId,
        container_type: ContainerType,
        capacity: usize,
    ) -> ExecutionResult<Self> {
        if container_type.is_any() {
            return Err(ExecutionError::InvalidArgument(format!(
                "executor {executor_id} cannot have the wildcard container type"
            )));
        }
        if capacity == 0 {
            return Err(ExecutionError::InvalidArgument(format!(
                "executor {executor_id} must have a positive capacity"
            )));
        }
        Ok(Self {
            executor_id,
            container_type,
            capacity,
            running_task_groups: Mutex::new(IndexSet::new()),
        })
    }
}

impl ExecutorRepresenter for LocalExecutorRepresenter {
    fn executor_id(&self) -> ExecutorId {
        self.executor_id.clone()
    }

    fn container_type(&self) -> ContainerType {
        self.container_type
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn running_task_groups(&self) -> HashSet<TaskGroupId> {
        self.running_task_groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn on_task_group_scheduled(&self, scheduled_task_group: &ScheduledTaskGroup) {
        let mut running = self
            .running_task_groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        running.insert(scheduled_task_group.task_group.task_group_id.clone());
    }

    fn on_task_group_execution_complete(&self, task_group_id: &TaskGroupId) {
        let mut running = self
            .running_task_groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !running.swap_remove(task_group_id) {
            warn!(
                "{task_group_id} is not running on executor {}",
                self.executor_id
            );
        }
    }
}
