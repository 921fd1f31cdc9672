//! Cluster coordination client
//!
//! Submodules:
//! - `vid_map`: volume id to volume server map, file id parsing
//! - `client`: master client following the coordinator and resolving chunk
//!   locations
pub mod client;
pub mod vid_map;

pub use client::{LocationSource, MasterClient, StaticLocationSource};
pub use vid_map::{VidMap, VolumeLocation, VolumeLocationUpdate};
