use crate::id::TaskGroupId;

/// A class of executor container (role or hardware profile).
///
/// `Any` is a wildcard used by task groups that can run on executors of
/// all concrete types. Executors themselves always have a concrete type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ContainerType {
    Transient,
    Reserved,
    Compute,
    Storage,
    Any,
}

impl ContainerType {
    /// The concrete container types, excluding the wildcard.
    pub fn concrete() -> [ContainerType; 4] {
        [
            ContainerType::Transient,
            ContainerType::Reserved,
            ContainerType::Compute,
            ContainerType::Storage,
        ]
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ContainerType::Any)
    }
}

impl std::fmt::Display for ContainerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContainerType::Transient => "transient",
            ContainerType::Reserved => "reserved",
            ContainerType::Compute => "compute",
            ContainerType::Storage => "storage",
            ContainerType::Any => "any",
        };
        write!(f, "{name}")
    }
}

/// The smallest unit of scheduling: a bundle of tasks dispatched together
/// to one executor.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    pub task_group_id: TaskGroupId,
    pub required_container_type: ContainerType,
}

/// A task group paired with its dispatch metadata.
///
/// The scheduling policy does not interpret the metadata; it only decides
/// where the task group runs.
#[derive(Debug, Clone)]
pub struct ScheduledTaskGroup {
    pub task_group: TaskGroup,
    /// The scheduling attempt, starting at zero and bumped by the caller
    /// each time the task group is rescheduled.
    pub attempt: usize,
}
