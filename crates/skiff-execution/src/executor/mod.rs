mod local;

use std::collections::HashSet;

pub use local::LocalExecutorRepresenter;

use crate::id::{ExecutorId, TaskGroupId};
use crate::task_group::{ContainerType, ScheduledTaskGroup};

/// A handle to a live executor, as seen by the scheduling policy.
///
/// The policy relies only on this capability set, so tests can substitute
/// a deterministic implementation.
pub trait ExecutorRepresenter: Send + Sync + 'static {
    /// The unique identifier of the executor.
    fn executor_id(&self) -> ExecutorId;

    /// The container type of the executor. Never `ContainerType::Any`.
    fn container_type(&self) -> ContainerType;

    /// The maximum number of task groups the executor runs concurrently.
    fn capacity(&self) -> usize;

    /// A snapshot of the task groups currently running on the executor.
    fn running_task_groups(&self) -> HashSet<TaskGroupId>;

    /// Record that a task group has been dispatched to the executor.
    fn on_task_group_scheduled(&self, scheduled_task_group: &ScheduledTaskGroup);

    /// Record that a task group no longer runs on the executor.
    fn on_task_group_execution_complete(&self, task_group_id: &TaskGroupId);
}
