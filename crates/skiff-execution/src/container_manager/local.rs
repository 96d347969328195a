use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::warn;

use crate::container_manager::ContainerManager;
use crate::executor::ExecutorRepresenter;
use crate::id::ExecutorId;

/// An in-process container manager backed by a shared map.
///
/// The runtime registers an executor here first and then notifies the
/// scheduling policy through its lifecycle hooks, so the policy's cache
/// refresh always observes the change.
#[derive(Default)]
pub struct LocalContainerManager {
    executors: RwLock<HashMap<ExecutorId, Arc<dyn ExecutorRepresenter>>>,
}

impl LocalContainerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_executor(&self, executor: Arc<dyn ExecutorRepresenter>) {
        let mut executors = self
            .executors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let executor_id = executor.executor_id();
        if executors.insert(executor_id.clone(), executor).is_some() {
            warn!("executor {executor_id} was already registered");
        }
    }

    pub fn deregister_executor(
        &self,
        executor_id: &ExecutorId,
    ) -> Option<Arc<dyn ExecutorRepresenter>> {
        let mut executors = self
            .executors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = executors.remove(executor_id);
        if removed.is_none() {
            warn!("executor {executor_id} is not registered");
        }
        removed
    }
}

impl ContainerManager for LocalContainerManager {
    fn executor_representer_map(&self) -> HashMap<ExecutorId, Arc<dyn ExecutorRepresenter>> {
        self.executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::executor::LocalExecutorRepresenter;
    use crate::task_group::ContainerType;

    fn executor(id: &str) -> Arc<dyn ExecutorRepresenter> {
        Arc::new(
            LocalExecutorRepresenter::new(ExecutorId::from(id), ContainerType::Compute, 1)
                .unwrap(),
        )
    }

    #[test]
    fn snapshots_reflect_registration_and_deregistration() {
        let manager = LocalContainerManager::new();
        manager.register_executor(executor("executor-1"));
        manager.register_executor(executor("executor-2"));

        let snapshot = manager.executor_representer_map();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key(&ExecutorId::from("executor-1")));

        let removed = manager.deregister_executor(&ExecutorId::from("executor-1"));
        assert!(removed.is_some());
        assert_eq!(manager.executor_representer_map().len(), 1);

        // An earlier snapshot is unaffected by later changes.
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn deregistering_an_unknown_executor_returns_none() {
        let manager = LocalContainerManager::new();
        assert!(manager
            .deregister_executor(&ExecutorId::from("executor-1"))
            .is_none());
    }
}
