//! Lock manager (C5): per-path exclusive advisory lock, persisted as a
//! sibling file so it survives a server restart (§4.5, §9).

use crate::error::ApiError;
use std::path::{Path, PathBuf};

pub struct LockManager {
    root: PathBuf,
}

/// `_page` -> `LOCK_page`, sitting next to the wiki file it guards.
fn lock_file_name(basename: &str) -> String {
    match basename.strip_prefix('_') {
        Some(rest) => format!("LOCK_{rest}"),
        None => format!("LOCK_{basename}"),
    }
}

impl LockManager {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn lock_path(&self, wiki_path: &str) -> PathBuf {
        let path = Path::new(wiki_path);
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or(wiki_path);
        let lock_name = lock_file_name(name);
        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => self.root.join(lock_name),
            Some(parent) => self.root.join(parent).join(lock_name),
            None => self.root.join(lock_name),
        }
    }

    pub fn user_has_lock(&self, wiki_path: &str, username: &str) -> std::io::Result<bool> {
        let lock_path = self.lock_path(wiki_path);
        match std::fs::read_to_string(&lock_path) {
            Ok(owner) => Ok(owner.trim() == username),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn acquire(&self, wiki_path: &str, username: &str) -> Result<(), ApiError> {
        let lock_path = self.lock_path(wiki_path);
        match std::fs::read_to_string(&lock_path) {
            Ok(owner) if owner.trim() == username => Ok(()),
            Ok(_) => Err(ApiError::LockedByOther),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = lock_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&lock_path, username)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn release(&self, wiki_path: &str, username: &str) -> std::io::Result<()> {
        let lock_path = self.lock_path(wiki_path);
        match std::fs::read_to_string(&lock_path) {
            Ok(owner) if owner.trim() == username => std::fs::remove_file(&lock_path),
            Ok(_) | Err(_) => Ok(()),
        }
    }

    /// Carries a held lock across a rename of its wiki file; a no-op if no
    /// lock file exists for `old_path`.
    pub fn rename(&self, old_path: &str, new_path: &str) -> std::io::Result<()> {
        let old_lock = self.lock_path(old_path);
        if !old_lock.exists() {
            return Ok(());
        }
        let new_lock = self.lock_path(new_path);
        if let Some(parent) = new_lock.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&old_lock, &new_lock)
    }

    pub fn is_lock_file(name: &str) -> bool {
        name.starts_with("LOCK_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_leaves_no_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockManager::new(dir.path().to_path_buf());
        locks.acquire("_page", "alice").unwrap();
        assert!(locks.user_has_lock("_page", "alice").unwrap());
        locks.release("_page", "alice").unwrap();
        assert!(!locks.user_has_lock("_page", "alice").unwrap());
    }

    #[test]
    fn acquire_by_second_user_fails() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockManager::new(dir.path().to_path_buf());
        locks.acquire("_page", "alice").unwrap();
        let err = locks.acquire("_page", "bob").unwrap_err();
        assert!(matches!(err, ApiError::LockedByOther));
    }

    #[test]
    fn reacquire_by_same_user_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockManager::new(dir.path().to_path_buf());
        locks.acquire("_page", "alice").unwrap();
        locks.acquire("_page", "alice").unwrap();
        assert!(locks.user_has_lock("_page", "alice").unwrap());
    }

    #[test]
    fn release_without_holding_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let locks = LockManager::new(dir.path().to_path_buf());
        locks.acquire("_page", "alice").unwrap();
        locks.release("_page", "bob").unwrap();
        assert!(locks.user_has_lock("_page", "alice").unwrap());
    }
}
