use std::collections::HashMap;
use std::sync::{Arc, Condvar};

use indexmap::IndexMap;
use log::warn;

use crate::container_manager::ContainerManager;
use crate::executor::ExecutorRepresenter;
use crate::id::ExecutorId;
use crate::task_group::ContainerType;

/// The executor pool for one container type.
pub(super) struct ContainerTypeRegistry {
    /// Executors of this type, in round-robin probe order.
    /// The insertion position determines the rotation.
    executor_ids: Vec<ExecutorId>,
    /// The cursor into `executor_ids` for the next probe.
    /// Stays within `0..executor_ids.len()` while the pool is non-empty
    /// and is reset to zero when the pool drains.
    next_executor_index: usize,
    /// Signalled whenever a slot of this type may have become free.
    /// Shared so a waiter can clone the handle out of the locked state
    /// before suspending on it.
    available: Arc<Condvar>,
}

impl ContainerTypeRegistry {
    fn new() -> Self {
        Self {
            executor_ids: Vec::new(),
            next_executor_index: 0,
            available: Arc::new(Condvar::new()),
        }
    }
}

/// All mutable policy state, guarded by the policy's single mutex.
pub(super) struct SchedulerState {
    /// Per-container-type registries, in the order the types were first
    /// referenced. The wildcard candidate list follows this order.
    registries: IndexMap<ContainerType, ContainerTypeRegistry>,
    /// A cached copy of the container manager's representer map, refreshed
    /// when an executor is added or removed.
    executor_map: HashMap<ExecutorId, Arc<dyn ExecutorRepresenter>>,
}

impl SchedulerState {
    pub(super) fn new() -> Self {
        let mut state = Self {
            registries: IndexMap::new(),
            executor_map: HashMap::new(),
        };
        // The wildcard registry must exist before any lookup for it.
        state.init_container_type(ContainerType::Any);
        state
    }

    pub(super) fn init_container_type(&mut self, container_type: ContainerType) {
        self.registries
            .entry(container_type)
            .or_insert_with(ContainerTypeRegistry::new);
    }

    pub(super) fn available_condvar(&self, container_type: ContainerType) -> Option<Arc<Condvar>> {
        self.registries
            .get(&container_type)
            .map(|registry| Arc::clone(&registry.available))
    }

    pub(super) fn refresh_executor_map(&mut self, container_manager: &dyn ContainerManager) {
        self.executor_map = container_manager.executor_representer_map();
    }

    pub(super) fn executor(&self, executor_id: &ExecutorId) -> Option<&Arc<dyn ExecutorRepresenter>> {
        self.executor_map.get(executor_id)
    }

    /// Insert an executor at the cursor position so it is probed next,
    /// before the executor the rotation would otherwise reach.
    pub(super) fn insert_executor_at_cursor(
        &mut self,
        container_type: ContainerType,
        executor_id: ExecutorId,
    ) {
        let registry = self
            .registries
            .entry(container_type)
            .or_insert_with(ContainerTypeRegistry::new);
        let index = registry.next_executor_index;
        registry.executor_ids.insert(index, executor_id);
    }

    /// Remove an executor from its registry, keeping the cursor pointed at
    /// the executor the rotation would have reached next.
    pub(super) fn remove_executor(
        &mut self,
        container_type: ContainerType,
        executor_id: &ExecutorId,
    ) {
        let Some(registry) = self.registries.get_mut(&container_type) else {
            warn!("no executor registry for container type {container_type}");
            return;
        };
        let Some(position) = registry
            .executor_ids
            .iter()
            .position(|id| id == executor_id)
        else {
            warn!("executor {executor_id} is not in the {container_type} registry");
            return;
        };
        if position < registry.next_executor_index {
            // An earlier entry is gone; the cursor shifts left with the list.
            registry.next_executor_index -= 1;
        } else if position == registry.next_executor_index {
            // The cursor's target is gone; restart the rotation.
            registry.next_executor_index = 0;
        }
        registry.executor_ids.remove(position);
    }

    /// Probe the candidate pool round-robin, starting at the cursor, and
    /// return the first executor with a free slot. The cursor advances to
    /// just past the selected executor; a failed pass leaves it unchanged.
    pub(super) fn select_executor_by_rr(
        &mut self,
        container_type: ContainerType,
    ) -> Option<ExecutorId> {
        let candidates = self.candidate_executor_ids(container_type);
        if candidates.is_empty() {
            return None;
        }
        let num_executors = candidates.len();
        let start = self
            .registries
            .get(&container_type)
            .map(|registry| registry.next_executor_index)
            .unwrap_or(0);
        for i in 0..num_executors {
            let index = (start + i) % num_executors;
            let selected = &candidates[index];
            let Some(executor) = self.executor_map.get(selected) else {
                warn!("executor {selected} is missing from the cached representer map");
                continue;
            };
            if has_free_slot(executor.as_ref()) {
                if let Some(registry) = self.registries.get_mut(&container_type) {
                    registry.next_executor_index = (index + 1) % num_executors;
                }
                return Some(selected.clone());
            }
        }
        None
    }

    /// Wake one waiter for the container type, and one wildcard waiter.
    pub(super) fn signal_available(&self, container_type: ContainerType) {
        if let Some(registry) = self.registries.get(&container_type) {
            registry.available.notify_one();
        }
        if !container_type.is_any() {
            if let Some(registry) = self.registries.get(&ContainerType::Any) {
                registry.available.notify_one();
            }
        }
    }

    fn candidate_executor_ids(&self, container_type: ContainerType) -> Vec<ExecutorId> {
        if container_type.is_any() {
            self.registries
                .iter()
                .filter(|(container_type, _)| !container_type.is_any())
                .flat_map(|(_, registry)| registry.executor_ids.iter().cloned())
                .collect()
        } else {
            self.registries
                .get(&container_type)
                .map(|registry| registry.executor_ids.clone())
                .unwrap_or_default()
        }
    }

    #[cfg(test)]
    pub(super) fn next_executor_index(&self, container_type: ContainerType) -> Option<usize> {
        self.registries
            .get(&container_type)
            .map(|registry| registry.next_executor_index)
    }

    #[cfg(test)]
    pub(super) fn registered_executor_ids(&self, container_type: ContainerType) -> Vec<ExecutorId> {
        self.registries
            .get(&container_type)
            .map(|registry| registry.executor_ids.clone())
            .unwrap_or_default()
    }
}

fn has_free_slot(executor: &dyn ExecutorRepresenter) -> bool {
    executor.running_task_groups().len() < executor.capacity()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::executor::LocalExecutorRepresenter;
    use crate::id::TaskGroupId;
    use crate::task_group::{ScheduledTaskGroup, TaskGroup};

    fn add_executor(
        state: &mut SchedulerState,
        id: &str,
        container_type: ContainerType,
        capacity: usize,
    ) -> ExecutorId {
        let executor_id = ExecutorId::from(id);
        let executor =
            LocalExecutorRepresenter::new(executor_id.clone(), container_type, capacity).unwrap();
        state
            .executor_map
            .insert(executor_id.clone(), Arc::new(executor));
        state.init_container_type(container_type);
        state.insert_executor_at_cursor(container_type, executor_id.clone());
        executor_id
    }

    fn occupy(state: &SchedulerState, executor_id: &ExecutorId, task_group_id: &str) {
        let scheduled = ScheduledTaskGroup {
            task_group: TaskGroup {
                task_group_id: TaskGroupId::from(task_group_id),
                required_container_type: ContainerType::Compute,
            },
            attempt: 0,
        };
        state
            .executor(executor_id)
            .unwrap()
            .on_task_group_scheduled(&scheduled);
    }

    #[test]
    fn selection_advances_the_cursor_by_one_on_success() {
        let mut state = SchedulerState::new();
        // Reverse registration order, since each insert lands at the cursor.
        for id in ["c", "b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        assert_eq!(
            state.registered_executor_ids(ContainerType::Compute),
            vec![ExecutorId::from("a"), ExecutorId::from("b"), ExecutorId::from("c")]
        );

        let selected = state.select_executor_by_rr(ContainerType::Compute).unwrap();
        assert_eq!(selected, ExecutorId::from("a"));
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(1));
    }

    #[test]
    fn failed_selection_leaves_the_cursor_unchanged() {
        let mut state = SchedulerState::new();
        let a = add_executor(&mut state, "a", ContainerType::Compute, 1);
        occupy(&state, &a, "tg-1");

        assert!(state.select_executor_by_rr(ContainerType::Compute).is_none());
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(0));
    }

    #[test]
    fn selection_skips_full_executors() {
        let mut state = SchedulerState::new();
        for id in ["c", "b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        occupy(&state, &ExecutorId::from("a"), "tg-1");

        let selected = state.select_executor_by_rr(ContainerType::Compute).unwrap();
        assert_eq!(selected, ExecutorId::from("b"));
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(2));
    }

    #[test]
    fn selection_on_an_unknown_type_returns_none() {
        let mut state = SchedulerState::new();
        assert!(state.select_executor_by_rr(ContainerType::Reserved).is_none());
        assert!(state.select_executor_by_rr(ContainerType::Any).is_none());
    }

    #[test]
    fn removal_before_the_cursor_shifts_it_left() {
        let mut state = SchedulerState::new();
        for id in ["c", "b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        // Advance the cursor past "a".
        state.select_executor_by_rr(ContainerType::Compute).unwrap();
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(1));

        state.remove_executor(ContainerType::Compute, &ExecutorId::from("a"));
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(0));
        assert_eq!(
            state.registered_executor_ids(ContainerType::Compute),
            vec![ExecutorId::from("b"), ExecutorId::from("c")]
        );
    }

    #[test]
    fn removal_at_the_cursor_restarts_the_rotation() {
        let mut state = SchedulerState::new();
        for id in ["c", "b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        state.select_executor_by_rr(ContainerType::Compute).unwrap();

        // The cursor points at "b"; removing it resets the rotation.
        state.remove_executor(ContainerType::Compute, &ExecutorId::from("b"));
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(0));
    }

    #[test]
    fn removal_after_the_cursor_leaves_it_unchanged() {
        let mut state = SchedulerState::new();
        for id in ["c", "b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        state.select_executor_by_rr(ContainerType::Compute).unwrap();

        state.remove_executor(ContainerType::Compute, &ExecutorId::from("c"));
        assert_eq!(state.next_executor_index(ContainerType::Compute), Some(1));
    }

    #[test]
    fn wildcard_candidates_follow_registry_iteration_order() {
        let mut state = SchedulerState::new();
        for id in ["b", "a"] {
            add_executor(&mut state, id, ContainerType::Compute, 1);
        }
        for id in ["y", "x"] {
            add_executor(&mut state, id, ContainerType::Storage, 1);
        }

        let candidates = state.candidate_executor_ids(ContainerType::Any);
        assert_eq!(
            candidates,
            vec![
                ExecutorId::from("a"),
                ExecutorId::from("b"),
                ExecutorId::from("x"),
                ExecutorId::from("y"),
            ]
        );
    }
}
