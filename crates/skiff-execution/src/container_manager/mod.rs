mod local;

use std::collections::HashMap;
use std::sync::Arc;

pub use local::LocalContainerManager;

use crate::executor::ExecutorRepresenter;
use crate::id::ExecutorId;

/// The authoritative registry of live executors, owned by the container
/// layer of the runtime. The scheduling policy refreshes its cached view
/// from this registry on executor lifecycle events.
pub trait ContainerManager: Send + Sync + 'static {
    /// A snapshot of the current executor representers, keyed by executor id.
    fn executor_representer_map(&self) -> HashMap<ExecutorId, Arc<dyn ExecutorRepresenter>>;
}
