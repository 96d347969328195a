mod core;
mod options;
mod state;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub use options::SchedulingPolicyOptions;

use crate::container_manager::ContainerManager;
use crate::error::ExecutionResult;
use crate::id::{ExecutorId, TaskGroupId};
use crate::scheduler::state::SchedulerState;
use crate::task_group::ScheduledTaskGroup;

/// The policy that places task groups on executors.
///
/// Implementations are shared between the scheduler thread and the
/// executor lifecycle threads, so every operation must be safe to call
/// concurrently.
pub trait SchedulingPolicy: Send + Sync {
    /// Try to find an executor with a free slot for the task group,
    /// waiting up to the configured timeout when none is available.
    ///
    /// Returning an executor id does not reserve the slot; the caller
    /// records the placement with
    /// [`on_task_group_scheduled`](SchedulingPolicy::on_task_group_scheduled).
    /// An empty result means the caller should retry later.
    fn attempt_schedule(
        &self,
        scheduled_task_group: &ScheduledTaskGroup,
    ) -> ExecutionResult<Option<ExecutorId>>;

    /// Notify the policy that an executor has joined the fleet.
    fn on_executor_added(&self, executor_id: &ExecutorId) -> ExecutionResult<()>;

    /// Notify the policy that an executor has left the fleet.
    ///
    /// Returns the task groups that were running on the executor so the
    /// caller can reschedule them.
    fn on_executor_removed(
        &self,
        executor_id: &ExecutorId,
    ) -> ExecutionResult<HashSet<TaskGroupId>>;

    /// Record that the task group has been dispatched to the executor.
    fn on_task_group_scheduled(
        &self,
        executor_id: &ExecutorId,
        scheduled_task_group: &ScheduledTaskGroup,
    ) -> ExecutionResult<()>;

    /// Record that the task group has finished on the executor, freeing a slot.
    fn on_task_group_execution_complete(
        &self,
        executor_id: &ExecutorId,
        task_group_id: &TaskGroupId,
    ) -> ExecutionResult<()>;

    /// Record that the task group has failed on the executor.
    ///
    /// The slot it occupied is freed; whether to reschedule the task group
    /// is the caller's decision.
    fn on_task_group_execution_failed(
        &self,
        executor_id: &ExecutorId,
        task_group_id: &TaskGroupId,
    ) -> ExecutionResult<()>;
}

/// A round-robin [`SchedulingPolicy`] keyed by container type.
///
/// The policy keeps an ordered pool of executors for each container type
/// and rotates a cursor over the pool when placing task groups. A caller
/// that finds no free slot blocks on the per-type condition variable until
/// a slot frees up or the configured timeout elapses.
pub struct RoundRobinSchedulingPolicy {
    container_manager: Arc<dyn ContainerManager>,
    options: SchedulingPolicyOptions,
    state: Mutex<SchedulerState>,
}

impl RoundRobinSchedulingPolicy {
    pub fn new(
        container_manager: Arc<dyn ContainerManager>,
        options: SchedulingPolicyOptions,
    ) -> Self {
        Self {
            container_manager,
            options,
            state: Mutex::new(SchedulerState::new()),
        }
    }
}
