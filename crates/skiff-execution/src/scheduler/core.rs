use std::collections::HashSet;
use std::sync::MutexGuard;

use log::{info, warn};

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::{ExecutorId, TaskGroupId};
use crate::scheduler::state::SchedulerState;
use crate::scheduler::{RoundRobinSchedulingPolicy, SchedulingPolicy};
use crate::task_group::ScheduledTaskGroup;

impl RoundRobinSchedulingPolicy {
    fn lock_state(&self) -> ExecutionResult<MutexGuard<'_, SchedulerState>> {
        self.state.lock().map_err(|e| {
            ExecutionError::SchedulingError(format!("scheduler state lock is poisoned: {e}"))
        })
    }
}

impl SchedulingPolicy for RoundRobinSchedulingPolicy {
    fn attempt_schedule(
        &self,
        scheduled_task_group: &ScheduledTaskGroup,
    ) -> ExecutionResult<Option<ExecutorId>> {
        let mut state = self.lock_state()?;
        let container_type = scheduled_task_group.task_group.required_container_type;
        state.init_container_type(container_type);

        if let Some(executor_id) = state.select_executor_by_rr(container_type) {
            return Ok(Some(executor_id));
        }

        // No executor can take the task group now. Wait for a slot of this
        // type to free up, then retry the selection exactly once; the caller
        // loops if it still needs a placement.
        let Some(available) = state.available_condvar(container_type) else {
            return Err(ExecutionError::InternalError(format!(
                "no executor registry for container type {container_type}"
            )));
        };
        let (mut state, wait) = available
            .wait_timeout(state, self.options.schedule_timeout)
            .map_err(|e| {
                ExecutionError::SchedulingError(format!("scheduler state lock is poisoned: {e}"))
            })?;
        if wait.timed_out() {
            Ok(None)
        } else {
            Ok(state.select_executor_by_rr(container_type))
        }
    }

    fn on_executor_added(&self, executor_id: &ExecutorId) -> ExecutionResult<()> {
        let mut state = self.lock_state()?;
        state.refresh_executor_map(self.container_manager.as_ref());
        let Some(executor) = state.executor(executor_id) else {
            return Err(ExecutionError::InvalidArgument(format!(
                "added executor {executor_id} is not known to the container manager"
            )));
        };
        let container_type = executor.container_type();
        state.insert_executor_at_cursor(container_type, executor_id.clone());
        info!("executor {executor_id} of container type {container_type} joined");
        state.signal_available(container_type);
        Ok(())
    }

    fn on_executor_removed(
        &self,
        executor_id: &ExecutorId,
    ) -> ExecutionResult<HashSet<TaskGroupId>> {
        let mut state = self.lock_state()?;
        // The cached map still holds the representer at this point; the
        // refresh below is what drops it.
        let Some(executor) = state.executor(executor_id) else {
            return Err(ExecutionError::InvalidArgument(format!(
                "removed executor {executor_id} is not in the cached representer map"
            )));
        };
        let container_type = executor.container_type();
        let running_task_groups = executor.running_task_groups();
        state.remove_executor(container_type, executor_id);
        state.refresh_executor_map(self.container_manager.as_ref());
        info!(
            "executor {executor_id} of container type {container_type} left with {} running task groups",
            running_task_groups.len()
        );
        // Removal never creates a free slot, so no waiter is signalled.
        Ok(running_task_groups)
    }

    fn on_task_group_scheduled(
        &self,
        executor_id: &ExecutorId,
        scheduled_task_group: &ScheduledTaskGroup,
    ) -> ExecutionResult<()> {
        let state = self.lock_state()?;
        let Some(executor) = state.executor(executor_id) else {
            return Err(ExecutionError::InvalidArgument(format!(
                "cannot schedule to unknown executor {executor_id}"
            )));
        };
        info!(
            "scheduling {} (attempt {}) to executor {executor_id}",
            scheduled_task_group.task_group.task_group_id, scheduled_task_group.attempt
        );
        executor.on_task_group_scheduled(scheduled_task_group);
        Ok(())
    }

    fn on_task_group_execution_complete(
        &self,
        executor_id: &ExecutorId,
        task_group_id: &TaskGroupId,
    ) -> ExecutionResult<()> {
        let state = self.lock_state()?;
        let Some(executor) = state.executor(executor_id) else {
            return Err(ExecutionError::InvalidArgument(format!(
                "cannot complete {task_group_id} on unknown executor {executor_id}"
            )));
        };
        executor.on_task_group_execution_complete(task_group_id);
        info!("completed {task_group_id} on executor {executor_id}");
        // A slot has freed up; a waiter on this type or on the wildcard
        // may now proceed.
        state.signal_available(executor.container_type());
        Ok(())
    }

    fn on_task_group_execution_failed(
        &self,
        executor_id: &ExecutorId,
        task_group_id: &TaskGroupId,
    ) -> ExecutionResult<()> {
        let state = self.lock_state()?;
        let Some(executor) = state.executor(executor_id) else {
            return Err(ExecutionError::InvalidArgument(format!(
                "cannot fail {task_group_id} on unknown executor {executor_id}"
            )));
        };
        // The slot is free regardless of the exit status; rescheduling the
        // task group stays with the caller.
        executor.on_task_group_execution_complete(task_group_id);
        warn!("failed {task_group_id} on executor {executor_id}");
        state.signal_available(executor.container_type());
        Ok(())
    }
}
