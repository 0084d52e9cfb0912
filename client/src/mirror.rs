//! Mirror cache (C3): per-wiki-path temporary backing file with refcount and
//! mtime-based dirty detection, so the kernel always sees an ordinary local
//! file descriptor for a wiki path while the server stays authoritative.

use crate::api_client::{decode_content, RemoteClient};
use crate::error::WikiError;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::warn;

struct MirrorEntry {
    backing_path: PathBuf,
    server_mtime: Option<SystemTime>,
    refcount: usize,
    lock_is_yours: bool,
}

/// All mutations of the entry table, and of a given entry's fields, are
/// serialized by this single mutex (§4.3). Download/upload transfers happen
/// while it is held, which intentionally serializes per-path cache traffic.
pub struct MirrorCache {
    dir: PathBuf,
    entries: Mutex<HashMap<String, MirrorEntry>>,
    next_id: Mutex<u64>,
}

/// Full filesystem-reported resolution (nanoseconds on most platforms), not
/// truncated to whole seconds: a fast open/write/close cycle can easily land
/// inside the same wall-clock second, and a second-truncated comparison
/// would then see no change and skip the upload.
fn file_mtime(path: &Path) -> Result<SystemTime, WikiError> {
    let meta = std::fs::metadata(path)?;
    Ok(meta.modified()?)
}

impl MirrorCache {
    pub fn new(local_root: &Path) -> std::io::Result<Self> {
        let dir = local_root.join(".wikifs-mirror");
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            entries: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        })
    }

    fn allocate_backing_path(&self) -> PathBuf {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        self.dir.join(format!("mirror-{id}"))
    }

    /// Returns the backing-file path and the server's synthesized mode.
    /// Downloads/refreshes content whenever there is no prior sync point, or
    /// the server reports the lock is no longer ours.
    pub fn acquire(
        &self,
        client: &RemoteClient,
        runtime: &tokio::runtime::Runtime,
        path: &str,
    ) -> Result<(PathBuf, u32), WikiError> {
        let mut entries = self.entries.lock().unwrap();

        if let Some(entry) = entries.get_mut(path) {
            if !entry.lock_is_yours || entry.server_mtime.is_none() {
                let resp = runtime.block_on(client.download(path))?;
                let bytes = decode_content(&resp.content)?;
                write_backing_file(&entry.backing_path, &bytes)?;
                entry.server_mtime = Some(file_mtime(&entry.backing_path)?);
                entry.lock_is_yours = resp.lock_is_yours;
                entry.refcount += 1;
                return Ok((entry.backing_path.clone(), resp.st_mode));
            }
            entry.refcount += 1;
            let resp = runtime.block_on(client.getattr(path))?;
            return Ok((entry.backing_path.clone(), resp.st_mode));
        }

        let resp = runtime.block_on(client.download(path))?;
        let bytes = decode_content(&resp.content)?;
        let backing_path = self.allocate_backing_path();
        write_backing_file(&backing_path, &bytes)?;
        let server_mtime = file_mtime(&backing_path)?;

        entries.insert(
            path.to_string(),
            MirrorEntry {
                backing_path: backing_path.clone(),
                server_mtime: Some(server_mtime),
                refcount: 1,
                lock_is_yours: resp.lock_is_yours,
            },
        );

        Ok((backing_path, resp.st_mode))
    }

    /// Uploads the backing file if its mtime moved since the last sync point,
    /// then decrements the refcount, unlinking the backing file at zero.
    pub fn release(
        &self,
        client: &RemoteClient,
        runtime: &tokio::runtime::Runtime,
        path: &str,
    ) -> Result<(), WikiError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(path) else {
            return Ok(());
        };

        let current_mtime = file_mtime(&entry.backing_path)?;
        if entry.server_mtime != Some(current_mtime) {
            let bytes = std::fs::read(&entry.backing_path)?;
            match runtime.block_on(client.upload(path, &bytes)) {
                Ok(()) => {}
                Err(WikiError::PermissionDenied) => {
                    warn!(%path, "upload skipped: lock was lost before release");
                }
                Err(e) => return Err(e),
            }
            entry.server_mtime = Some(current_mtime);
        }

        entry.refcount -= 1;
        if entry.refcount == 0 {
            let backing_path = entry.backing_path.clone();
            entries.remove(path);
            let _ = std::fs::remove_file(&backing_path);
        }

        Ok(())
    }

    /// True while any open handle still references this path's mirror entry.
    pub fn is_open(&self, path: &str) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    /// Forces the mirror entry (if present) to materialize with fresh content
    /// on the next `acquire`. Used after a rename or explicit invalidation.
    pub fn forget(&self, path: &str) {
        self.entries.lock().unwrap().remove(path);
    }
}

fn write_backing_file(path: &Path, bytes: &[u8]) -> Result<(), WikiError> {
    let mut f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    f.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_backing_path_yields_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MirrorCache::new(dir.path()).unwrap();
        let a = cache.allocate_backing_path();
        let b = cache.allocate_backing_path();
        assert_ne!(a, b);
    }

    #[test]
    fn forget_removes_entry_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MirrorCache::new(dir.path()).unwrap();
        cache.entries.lock().unwrap().insert(
            "_a".to_string(),
            MirrorEntry {
                backing_path: dir.path().join("mirror-1"),
                server_mtime: Some(SystemTime::now()),
                refcount: 1,
                lock_is_yours: true,
            },
        );
        cache.forget("_a");
        assert!(cache.entries.lock().unwrap().get("_a").is_none());
    }
}
