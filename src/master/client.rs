//! Master client: tracks the current cluster coordinator and keeps the volume
//! location map in sync with it.

use super::vid_map::{VidMap, VolumeLocation, VolumeLocationUpdate};
use crate::chuck::chunk::FileId;
use crate::chuck::error::ChunkError;
use crate::chuck::locator::{ChunkLocation, ChunkLocator};
use crate::config::VolumeConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Feed of volume location changes published by a master.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Wait for the next batch of changes from `master`. An error means the
    /// connection to that master is lost.
    async fn next_updates(&self, master: &str) -> Result<Vec<VolumeLocationUpdate>, ChunkError>;
}

/// Publishes a fixed set of volumes once, then stays quiet.
pub struct StaticLocationSource {
    updates: Vec<VolumeLocationUpdate>,
    delivered: AtomicBool,
}

impl StaticLocationSource {
    pub fn new(updates: Vec<VolumeLocationUpdate>) -> Self {
        Self {
            updates,
            delivered: AtomicBool::new(false),
        }
    }

    pub fn from_config(volumes: &[VolumeConfig]) -> Self {
        Self::new(volumes.iter().map(update_from_config).collect())
    }
}

fn update_from_config(v: &VolumeConfig) -> VolumeLocationUpdate {
    VolumeLocationUpdate {
        location: VolumeLocation {
            url: v.url.clone(),
            public_url: v.public_url.clone().unwrap_or_else(|| v.url.clone()),
        },
        new_vids: vec![v.vid],
        deleted_vids: vec![],
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn next_updates(&self, _master: &str) -> Result<Vec<VolumeLocationUpdate>, ChunkError> {
        if self.delivered.swap(true, Ordering::AcqRel) {
            std::future::pending::<()>().await;
        }
        Ok(self.updates.clone())
    }
}

pub struct MasterClient {
    name: String,
    masters: Vec<String>,
    current_master: RwLock<String>,
    vid_map: VidMap,
    source: Arc<dyn LocationSource>,
    reconnect_interval: Duration,
}

impl MasterClient {
    pub fn new(
        name: impl Into<String>,
        masters: Vec<String>,
        source: Arc<dyn LocationSource>,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            masters,
            current_master: RwLock::new(String::new()),
            vid_map: VidMap::new(),
            source,
            reconnect_interval,
        }
    }

    /// Seed the location map directly, without a master.
    pub async fn with_static_volumes(self, volumes: &[VolumeConfig]) -> Self {
        for v in volumes {
            self.vid_map.apply(&update_from_config(v)).await;
        }
        self
    }

    /// Address of the master currently followed, empty while disconnected.
    pub async fn get_master(&self) -> String {
        self.current_master.read().await.clone()
    }

    pub fn vid_map(&self) -> &VidMap {
        &self.vid_map
    }

    /// Follow the configured masters in turn until `cancel` fires.
    pub async fn keep_connected_to_master(&self, cancel: CancellationToken) {
        if self.masters.is_empty() {
            warn!(client = %self.name, "no master configured, serving static volume locations");
            cancel.cancelled().await;
            return;
        }

        let mut idx = 0usize;
        loop {
            let master = &self.masters[idx % self.masters.len()];
            tokio::select! {
                _ = cancel.cancelled() => return,
                Err(e) = self.follow_master(master) => {
                    warn!(client = %self.name, master = %master, error = %e, "lost master connection");
                }
            }
            self.current_master.write().await.clear();
            idx = idx.wrapping_add(1);

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.reconnect_interval) => {}
            }
        }
    }

    async fn follow_master(&self, master: &str) -> Result<(), ChunkError> {
        loop {
            let updates = self.source.next_updates(master).await?;
            {
                let mut current = self.current_master.write().await;
                if current.as_str() != master {
                    info!(client = %self.name, master = %master, "connected to master");
                    *current = master.to_string();
                }
            }
            for u in &updates {
                self.vid_map.apply(u).await;
            }
        }
    }
}

#[async_trait]
impl ChunkLocator for MasterClient {
    async fn lookup_file_id(&self, file_id: &FileId) -> Result<ChunkLocation, ChunkError> {
        self.vid_map.lookup_file_id(file_id).await
    }
}
