use crate::api::error::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const OP_UPLOAD: &str = "Upload";
pub const OP_UPDATE_FILE: &str = "UpdateFile";
pub const OP_GET_DOWNLOAD_LINK: &str = "GetDownloadLink";
pub const OP_LIST_FILES: &str = "ListFiles";
pub const OP_DOWNLOAD_ZIP: &str = "DownloadZip";

/// Concurrency pool an operation is admitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    FileOps,
    ListOps,
}

/// Maps an operation name to its admission class.
///
/// Only listing goes through the list pool; anything else, including names
/// we do not recognise, is treated as a blob transfer.
pub fn classify(operation: &str) -> OperationClass {
    if operation.ends_with(OP_LIST_FILES) {
        OperationClass::ListOps
    } else {
        OperationClass::FileOps
    }
}

/// Two independent counting semaphores bounding in-flight file transfers and
/// listings.
///
/// A slot is represented by an [`AdmissionPermit`]; dropping the permit gives
/// the slot back, so release happens on every exit path including task
/// cancellation.
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    file_ops: Arc<Semaphore>,
    list_ops: Arc<Semaphore>,
    file_ops_capacity: usize,
    list_ops_capacity: usize,
}

#[derive(Debug)]
pub struct AdmissionPermit {
    class: OperationClass,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    pub fn class(&self) -> OperationClass {
        self.class
    }
}

impl AdmissionLimiter {
    /// Capacities below one are raised to one so that no class can be
    /// configured into a permanent stall.
    pub fn new(file_ops_capacity: usize, list_ops_capacity: usize) -> Self {
        let file_ops_capacity = file_ops_capacity.max(1);
        let list_ops_capacity = list_ops_capacity.max(1);
        Self {
            file_ops: Arc::new(Semaphore::new(file_ops_capacity)),
            list_ops: Arc::new(Semaphore::new(list_ops_capacity)),
            file_ops_capacity,
            list_ops_capacity,
        }
    }

    fn pool(&self, class: OperationClass) -> &Arc<Semaphore> {
        match class {
            OperationClass::FileOps => &self.file_ops,
            OperationClass::ListOps => &self.list_ops,
        }
    }

    /// Waits until a slot of `class` is free. There is no timeout here; the
    /// caller bounds the wait by dropping the future.
    ///
    /// Fails with `Internal` only if the pool has been closed.
    pub async fn acquire(&self, class: OperationClass) -> AppResult<AdmissionPermit> {
        let permit = self
            .pool(class)
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| {
                tracing::error!(?class, "admission pool closed: {}", e);
                AppError::internal(e)
            })?;
        Ok(AdmissionPermit {
            class,
            _permit: permit,
        })
    }

    pub async fn acquire_for(&self, operation: &str) -> AppResult<AdmissionPermit> {
        self.acquire(classify(operation)).await
    }

    pub fn capacity(&self, class: OperationClass) -> usize {
        match class {
            OperationClass::FileOps => self.file_ops_capacity,
            OperationClass::ListOps => self.list_ops_capacity,
        }
    }

    pub fn available(&self, class: OperationClass) -> usize {
        self.pool(class).available_permits()
    }
}
