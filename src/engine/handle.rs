// src/engine/handle.rs

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::task::TaskRecord;
use crate::types::TaskId;

/// Cloneable entry point into a running [`Runtime`](super::Runtime) for
/// the inbound session layer.
#[derive(Debug, Clone)]
pub struct EnqueueHandle {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl EnqueueHandle {
    pub fn new(tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }

    /// Queue a task right away, deduplicated like a pulled one.
    pub async fn enqueue_immediate(&self, task: TaskRecord) -> Result<()> {
        self.tx.send(RuntimeEvent::EnqueueImmediate { task }).await?;
        Ok(())
    }

    pub async fn cancel(&self, task_id: TaskId) -> Result<()> {
        self.tx.send(RuntimeEvent::CancelRequested { task_id }).await?;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(RuntimeEvent::ShutdownRequested).await?;
        Ok(())
    }
}
