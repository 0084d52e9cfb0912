use crate::lock::LockManager;
use crate::revision::RevisionRecorder;
use crate::users::UserDb;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub users: Arc<UserDb>,
    pub locks: Arc<LockManager>,
    pub revisions: Arc<RevisionRecorder>,
}

impl AppState {
    pub fn new(root: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&root)?;
        let users = Arc::new(UserDb::load(&root)?);
        let locks = Arc::new(LockManager::new(root.clone()));
        let revisions = Arc::new(RevisionRecorder::new(root.clone())?);
        Ok(Self { root, users, locks, revisions })
    }
}
