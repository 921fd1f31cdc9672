//! Volume id to volume server map.

use crate::chuck::chunk::FileId;
use crate::chuck::error::ChunkError;
use crate::chuck::locator::ChunkLocation;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeLocation {
    pub url: String,
    pub public_url: String,
}

/// One server's view of the volumes it gained and lost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeLocationUpdate {
    pub location: VolumeLocation,
    pub new_vids: Vec<u32>,
    pub deleted_vids: Vec<u32>,
}

/// Extract the volume id from a `"<vid>,<needle>"` file id.
pub fn parse_volume_id(file_id: &FileId) -> Result<u32, ChunkError> {
    let invalid = || ChunkError::InvalidFileId(file_id.to_string());
    let (vid, needle) = file_id.as_str().split_once(',').ok_or_else(invalid)?;
    // the needle ends up in object keys and volume server URLs
    if needle.is_empty() || needle.contains(['/', '\\']) || needle.contains("..") {
        return Err(invalid());
    }
    vid.trim().parse().map_err(|_| invalid())
}

#[derive(Default)]
pub struct VidMap {
    locations: RwLock<HashMap<u32, Vec<VolumeLocation>>>,
}

impl VidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_location(&self, vid: u32, loc: VolumeLocation) {
        let mut map = self.locations.write().await;
        let replicas = map.entry(vid).or_default();
        if !replicas.iter().any(|l| l.url == loc.url) {
            replicas.push(loc);
        }
    }

    pub async fn delete_location(&self, vid: u32, url: &str) {
        let mut map = self.locations.write().await;
        if let Some(replicas) = map.get_mut(&vid) {
            replicas.retain(|l| l.url != url);
            if replicas.is_empty() {
                map.remove(&vid);
            }
        }
    }

    pub async fn apply(&self, update: &VolumeLocationUpdate) {
        for vid in &update.new_vids {
            self.add_location(*vid, update.location.clone()).await;
        }
        for vid in &update.deleted_vids {
            self.delete_location(*vid, &update.location.url).await;
        }
    }

    /// First known replica of `vid`.
    pub async fn lookup_volume_server_url(&self, vid: u32) -> Result<String, ChunkError> {
        self.locations
            .read()
            .await
            .get(&vid)
            .and_then(|replicas| replicas.first())
            .map(|l| l.url.clone())
            .ok_or(ChunkError::VolumeNotFound(vid))
    }

    pub async fn lookup_file_id(&self, file_id: &FileId) -> Result<ChunkLocation, ChunkError> {
        let vid = parse_volume_id(file_id)?;
        let server = self.lookup_volume_server_url(vid).await?;
        Ok(ChunkLocation {
            server,
            file_id: file_id.clone(),
        })
    }
}
