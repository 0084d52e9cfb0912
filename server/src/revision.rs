//! Revision recorder (C6): wraps the content root as a tracked revision
//! repository by shelling out to `git` (§4.6), the commodity tool named in
//! §1. Every invocation runs under a single mutex so commands never
//! interleave (§5).

use crate::error::ApiError;
use crate::users::User;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

pub struct RevisionRecorder {
    root: PathBuf,
    git_lock: Mutex<()>,
}

impl RevisionRecorder {
    pub fn new(root: PathBuf) -> std::io::Result<Self> {
        if !root.join(".git").exists() {
            let status = Command::new("git").arg("init").current_dir(&root).status()?;
            if !status.success() {
                return Err(std::io::Error::other("git init failed"));
            }
        }
        Ok(Self { root, git_lock: Mutex::new(()) })
    }

    fn run(&self, args: &[&str], user: &User) -> Result<(), ApiError> {
        let (name, email) = user.commit_identity();
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("GIT_AUTHOR_NAME", &name)
            .env("GIT_COMMITTER_NAME", &name)
            .env("GIT_AUTHOR_EMAIL", &email)
            .env("GIT_COMMITTER_EMAIL", &email)
            .status()
            .map_err(|e| ApiError::Io(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(ApiError::Io(format!("git {args:?} exited with {status}")))
        }
    }

    fn is_tracked(&self, rel_path: &str) -> bool {
        Command::new("git")
            .args(["ls-files", "--error-unmatch", rel_path])
            .current_dir(&self.root)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn is_dirty(&self, rel_path: &str) -> Result<bool, ApiError> {
        let output = Command::new("git")
            .args(["status", "--porcelain", "--", rel_path])
            .current_dir(&self.root)
            .output()
            .map_err(|e| ApiError::Io(e.to_string()))?;
        if !output.status.success() {
            return Err(ApiError::Io("git status --porcelain failed".to_string()));
        }
        Ok(!output.stdout.is_empty())
    }

    /// Commits the current working-copy content of `rel_path` if it is new
    /// or changed since the last revision; a no-op otherwise (I4).
    pub fn commit_if_dirty(&self, rel_path: &str, user: &User) -> Result<(), ApiError> {
        let _guard = self.git_lock.lock().unwrap();
        if !self.is_tracked(rel_path) {
            self.run(&["add", rel_path], user)?;
            self.run(&["commit", "-m", &format!("New {rel_path}")], user)
        } else if self.is_dirty(rel_path)? {
            self.run(&["add", rel_path], user)?;
            self.run(&["commit", "-m", &format!("Edit {rel_path}")], user)
        } else {
            Ok(())
        }
    }

    pub fn remove(&self, rel_path: &str, user: &User) -> Result<(), ApiError> {
        let _guard = self.git_lock.lock().unwrap();
        if self.is_tracked(rel_path) {
            self.run(&["rm", "-f", rel_path], user)?;
            self.run(&["commit", "-m", &format!("Remove {rel_path}")], user)
        } else {
            std::fs::remove_file(self.root.join(rel_path)).map_err(ApiError::from)
        }
    }

    pub fn rename(&self, old_rel: &str, new_rel: &str, user: &User) -> Result<(), ApiError> {
        let _guard = self.git_lock.lock().unwrap();
        if self.is_tracked(old_rel) {
            self.run(&["mv", old_rel, new_rel], user)?;
            self.run(&["commit", "-m", &format!("Rename {old_rel} -> {new_rel}")], user)
        } else {
            std::fs::rename(self.root.join(old_rel), self.root.join(new_rel)).map_err(ApiError::from)
        }
    }
}
