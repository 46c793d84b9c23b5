//! Resource management

use crate::error::PivotError;

use tokio::sync::{Semaphore, SemaphorePermit};

/// [crate::resource_manager::ResourceManager] provides a simple way to allocate various resources
/// to tasks. Resource management is performed using a Tokio Semaphore for each type of resource.
#[derive(Debug)]
pub struct ResourceManager {
    /// Optional semaphore for outbound connections fetching source data.
    connections: Option<Semaphore>,

    /// Optional semaphore for pivot tasks.
    tasks: Option<Semaphore>,
}

impl ResourceManager {
    /// Returns a new ResourceManager object.
    pub fn new(connection_limit: Option<usize>, task_limit: Option<usize>) -> Self {
        Self {
            connections: connection_limit.map(Semaphore::new),
            tasks: task_limit.map(Semaphore::new),
        }
    }

    /// Acquire a connection resource.
    pub async fn connection(&self) -> Result<Option<SemaphorePermit>, PivotError> {
        optional_acquire(&self.connections).await
    }

    /// Acquire a task resource.
    pub async fn task(&self) -> Result<Option<SemaphorePermit>, PivotError> {
        optional_acquire(&self.tasks).await
    }
}

/// Acquire a permit on an optional Semaphore, if present.
async fn optional_acquire(sem: &Option<Semaphore>) -> Result<Option<SemaphorePermit>, PivotError> {
    if let Some(sem) = sem {
        sem.acquire().await.map(Some).map_err(|err| err.into())
    } else {
        Ok(None)
    }
}
