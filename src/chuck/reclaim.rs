//! Chunk reclamation: locate and delete chunks no entry references anymore.
//!
//! Every chunk is handled independently and every network call is bounded by
//! its own timeout, so one unreachable volume server cannot hold up the rest
//! of the batch. Failures are logged and counted, never returned to the
//! metadata operation that triggered the batch.

use super::chunk::FileId;
use super::deleter::ChunkDeleter;
use super::error::ChunkError;
use super::locator::ChunkLocator;
use crate::config::{ReclaimConfig, ReclaimMode};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReclaimReport {
    pub deleted: Vec<FileId>,
    pub failed: Vec<FileId>,
}

pub struct ChunkReclaimer {
    locator: Arc<dyn ChunkLocator>,
    deleter: Arc<dyn ChunkDeleter>,
    lookup_timeout: Duration,
    delete_timeout: Duration,
    mode: ReclaimMode,
}

impl ChunkReclaimer {
    pub fn new(
        locator: Arc<dyn ChunkLocator>,
        deleter: Arc<dyn ChunkDeleter>,
        cfg: &ReclaimConfig,
    ) -> Self {
        Self {
            locator,
            deleter,
            lookup_timeout: cfg.lookup_timeout(),
            delete_timeout: cfg.delete_timeout(),
            mode: cfg.mode,
        }
    }

    pub fn mode(&self) -> ReclaimMode {
        self.mode
    }

    /// Locate then delete a single chunk.
    pub async fn reclaim_one(&self, file_id: &FileId) -> Result<(), ChunkError> {
        let location = timeout(self.lookup_timeout, self.locator.lookup_file_id(file_id))
            .await
            .map_err(|_| ChunkError::Timeout {
                op: "lookup",
                file_id: file_id.clone(),
                after: self.lookup_timeout,
            })??;

        timeout(
            self.delete_timeout,
            self.deleter.delete_from_volume_server(&location, None),
        )
        .await
        .map_err(|_| ChunkError::Timeout {
            op: "delete",
            file_id: file_id.clone(),
            after: self.delete_timeout,
        })??;

        debug!(file_id = %file_id, server = %location.server, "chunk reclaimed");
        Ok(())
    }

    /// Reclaim a batch concurrently and report the outcome per chunk.
    pub async fn reclaim(&self, file_ids: &[FileId]) -> ReclaimReport {
        let outcomes = join_all(file_ids.iter().map(|fid| self.reclaim_one(fid))).await;

        let mut report = ReclaimReport::default();
        for (fid, outcome) in file_ids.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.deleted.push(fid.clone()),
                Err(e) => {
                    warn!(file_id = %fid, error = %e, "chunk reclamation failed");
                    report.failed.push(fid.clone());
                }
            }
        }
        report
    }

    /// Reclaim according to the configured mode. Inline mode returns the
    /// report; background mode spawns the batch and returns `None`.
    pub async fn dispatch(self: &Arc<Self>, file_ids: Vec<FileId>) -> Option<ReclaimReport> {
        if file_ids.is_empty() {
            return Some(ReclaimReport::default());
        }
        match self.mode {
            ReclaimMode::Inline => Some(self.reclaim(&file_ids).await),
            ReclaimMode::Background => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let report = this.reclaim(&file_ids).await;
                    debug!(
                        deleted = report.deleted.len(),
                        failed = report.failed.len(),
                        "background reclamation finished"
                    );
                });
                None
            }
        }
    }
}
