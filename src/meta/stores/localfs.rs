//! Entry store on a local directory tree.
//!
//! Every namespace directory maps to one filesystem directory, nested the
//! same way: `/a/b/c` lives at `<root>/<seg(a)>/<seg(b)>/<seg(c)>.json`.
//! Segments are hex encoded (`h` prefix) while that fits a file name, and
//! replaced by their SHA-256 (`s` prefix) beyond that. The real path is always
//! stored inside the JSON document. Inserts go through a hard link from a
//! temp file, which fails atomically when the target exists; updates go
//! through a rename.

use crate::meta::entry::Entry;
use crate::meta::path::FullPath;
use crate::meta::store::{EntryStore, StoreError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const ENTRY_SUFFIX: &str = ".json";
const HEX_PREFIX: char = 'h';
const HASH_PREFIX: char = 's';
/// Longest hex segment kept as is; leaves room for prefix, suffix and the
/// temp file tail under the usual 255 byte name limit.
const MAX_HEX_SEGMENT: usize = 200;

/// File system name for one namespace segment.
fn encode_segment(name: &str) -> String {
    let hex = hex::encode(name);
    if hex.len() <= MAX_HEX_SEGMENT {
        format!("{HEX_PREFIX}{hex}")
    } else {
        format!("{HASH_PREFIX}{}", hex::encode(Sha256::digest(name.as_bytes())))
    }
}

/// Segment name recoverable from the file name alone, `None` when hashed.
fn decode_segment(encoded: &str) -> Option<String> {
    let hex = encoded.strip_prefix(HEX_PREFIX)?;
    String::from_utf8(hex::decode(hex).ok()?).ok()
}

pub struct LocalFsEntryStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl LocalFsEntryStore {
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            tmp_seq: AtomicU64::new(0),
        })
    }

    fn bucket_for(&self, dir: &FullPath) -> PathBuf {
        let mut bucket = self.root.clone();
        for seg in dir.as_str().split('/').filter(|s| !s.is_empty()) {
            bucket.push(encode_segment(seg));
        }
        bucket
    }

    fn path_for(&self, p: &FullPath) -> PathBuf {
        let (dir, name) = p.dir_and_name();
        self.bucket_for(&dir)
            .join(format!("{}{ENTRY_SUFFIX}", encode_segment(name)))
    }

    fn tmp_path_for(&self, target: &Path) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let mut name = target.as_os_str().to_owned();
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        PathBuf::from(name)
    }

    async fn write_tmp(&self, target: &Path, entry: &Entry) -> Result<PathBuf, StoreError> {
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.tmp_path_for(target);
        fs::write(&tmp, serde_json::to_vec(entry)?).await?;
        Ok(tmp)
    }

    async fn read_entry_file(&self, file: &Path) -> Result<Option<Entry>, StoreError> {
        match fs::read(file).await {
            Ok(buf) => Ok(Some(serde_json::from_slice(&buf)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl EntryStore for LocalFsEntryStore {
    fn name(&self) -> &'static str {
        "localfs"
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let target = self.path_for(&entry.full_path);
        let tmp = self.write_tmp(&target, entry).await?;
        let linked = fs::hard_link(&tmp, &target).await;
        let _ = fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(entry.full_path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let target = self.path_for(&entry.full_path);
        if !fs::try_exists(&target).await? {
            return Err(StoreError::NotFound(entry.full_path.clone()));
        }
        let tmp = self.write_tmp(&target, entry).await?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn find_entry(&self, path: &FullPath) -> Result<Entry, StoreError> {
        self.read_entry_file(&self.path_for(path))
            .await?
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }

    async fn delete_entry(&self, path: &FullPath) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(path)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if !path.is_root() {
            // drop the bucket of a removed directory; fails while it has children
            let _ = fs::remove_dir(self.bucket_for(path)).await;
        }
        Ok(())
    }

    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        let bucket = self.bucket_for(dir);
        let mut rd = match fs::read_dir(&bucket).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(de) = rd.next_entry().await? {
            let file_name = de.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(ENTRY_SUFFIX)) else {
                // temp files and child buckets
                continue;
            };
            let name = match decode_segment(stem) {
                Some(name) => name,
                None => match self.read_entry_file(&de.path()).await? {
                    Some(e) => e.full_path.name().to_string(),
                    None => continue,
                },
            };
            files.push((name, de.path()));
        }

        files.retain(|(name, _)| {
            !name.is_empty()
                && if inclusive {
                    name.as_str() >= start_file_name
                } else {
                    name.as_str() > start_file_name
                }
        });
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.truncate(limit);

        let mut out = Vec::with_capacity(files.len());
        for (_, file) in files {
            // removed between readdir and read
            if let Some(e) = self.read_entry_file(&file).await? {
                out.push(e);
            }
        }
        Ok(out)
    }
}
