//! Root of the FUSE filesystem implementation (C4).
//!
//! `RemoteFs` holds all state needed to serve FUSE requests: the HTTP client,
//! the Tokio runtime used to drive it, the inode tables, the open file table,
//! and the mirror cache for wiki paths. `FsWrapper` is the dispatcher: every
//! kernel call lands here and is forwarded to the matching sub-module.

use crate::api_client::RemoteClient;
use crate::classify::{classify, Classification};
use crate::config::Config;
use crate::mirror::MirrorCache;
use fuser::{FileAttr, FileType, Filesystem};
use fuser::{ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, ReplyXattr};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

pub mod prelude;
mod attr;
mod create;
mod delete;
mod dir;
mod io;
mod rename;
mod xattr;

pub const ROOT_INO: u64 = 1;

/// A kernel-visible open file: a real fd against either the mirror cache's
/// backing file (wiki paths) or the actual local file (local paths).
pub struct OpenHandle {
    pub(crate) file: std::fs::File,
    pub(crate) path: String,
    pub(crate) is_wiki: bool,
}

pub struct RemoteFs {
    pub(crate) client: RemoteClient,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) config: Config,
    pub(crate) mirror: MirrorCache,

    pub(crate) inode_to_path: HashMap<u64, String>,
    pub(crate) path_to_inode: HashMap<String, u64>,
    pub(crate) inode_to_kind: HashMap<u64, FileType>,
    pub(crate) next_inode: u64,

    pub(crate) open_files: HashMap<u64, OpenHandle>,
    pub(crate) next_fh: u64,

    /// Serializes the seek+transfer pair within `read`/`write`, per §5.
    pub(crate) io_lock: Mutex<()>,
}

impl RemoteFs {
    pub fn new(config: Config) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.local_root)?;
        let mirror = MirrorCache::new(&config.local_root)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to build tokio runtime");
        let client = RemoteClient::new(config.server_url.clone(), config.auth_token.clone());

        let mut fs = Self {
            client,
            runtime,
            config,
            mirror,
            inode_to_path: HashMap::new(),
            path_to_inode: HashMap::new(),
            inode_to_kind: HashMap::new(),
            next_inode: 2,
            open_files: HashMap::new(),
            next_fh: 1,
            io_lock: Mutex::new(()),
        };

        fs.inode_to_path.insert(ROOT_INO, String::new());
        fs.path_to_inode.insert(String::new(), ROOT_INO);
        fs.inode_to_kind.insert(ROOT_INO, FileType::Directory);
        Ok(fs)
    }

    pub(crate) fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.config.kernel_attr_timeout_seconds)
    }

    pub(crate) fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.config.kernel_entry_timeout_seconds)
    }

    /// Allocates (or returns the existing) inode for a relative path.
    pub(crate) fn inode_for(&mut self, path: &str, kind: FileType) -> u64 {
        if let Some(&ino) = self.path_to_inode.get(path) {
            self.inode_to_kind.insert(ino, kind);
            return ino;
        }
        let ino = self.next_inode;
        self.next_inode += 1;
        self.path_to_inode.insert(path.to_string(), ino);
        self.inode_to_path.insert(ino, path.to_string());
        self.inode_to_kind.insert(ino, kind);
        ino
    }

    pub(crate) fn forget_inode(&mut self, ino: u64) {
        if let Some(path) = self.inode_to_path.remove(&ino) {
            self.path_to_inode.remove(&path);
        }
        self.inode_to_kind.remove(&ino);
    }

    /// Joins a parent's path with a child name, producing a root-relative path.
    pub(crate) fn join_path(parent: &str, name: &str) -> String {
        if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        }
    }

    pub(crate) fn local_fs_path(&self, rel: &str) -> PathBuf {
        self.config.local_root.join(rel)
    }

    pub(crate) fn classify(rel: &str) -> Classification {
        classify(rel)
    }
}

pub(crate) fn root_dir_attr() -> FileAttr {
    FileAttr {
        ino: ROOT_INO,
        size: 0,
        blocks: 0,
        atime: UNIX_EPOCH,
        mtime: UNIX_EPOCH,
        ctime: UNIX_EPOCH,
        crtime: UNIX_EPOCH,
        kind: FileType::Directory,
        perm: 0o755,
        nlink: 2,
        uid: 501,
        gid: 20,
        rdev: 0,
        flags: 0,
        blksize: 4096,
    }
}

#[derive(Clone)]
pub struct FsWrapper(pub Arc<Mutex<RemoteFs>>);

impl Filesystem for FsWrapper {
    fn getattr(&mut self, req: &fuser::Request, ino: u64, reply: ReplyAttr) {
        let mut fs = self.0.lock().unwrap();
        attr::getattr(&mut fs, req, ino, reply);
    }

    fn setattr(
        &mut self,
        req: &fuser::Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<fuser::TimeOrNow>,
        mtime: Option<fuser::TimeOrNow>,
        ctime: Option<std::time::SystemTime>,
        fh: Option<u64>,
        crtime: Option<std::time::SystemTime>,
        chgtime: Option<std::time::SystemTime>,
        bkuptime: Option<std::time::SystemTime>,
        flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let mut fs = self.0.lock().unwrap();
        attr::setattr(
            &mut fs, req, ino, mode, uid, gid, size, atime, mtime, ctime, fh, crtime, chgtime,
            bkuptime, flags, reply,
        );
    }

    fn lookup(&mut self, req: &fuser::Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let mut fs = self.0.lock().unwrap();
        dir::lookup(&mut fs, req, parent, name, reply);
    }

    fn readdir(&mut self, req: &fuser::Request, ino: u64, fh: u64, offset: i64, reply: ReplyDirectory) {
        let mut fs = self.0.lock().unwrap();
        dir::readdir(&mut fs, req, ino, fh, offset, reply);
    }

    fn open(&mut self, req: &fuser::Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let mut fs = self.0.lock().unwrap();
        dir::open(&mut fs, req, ino, flags, reply);
    }

    fn read(
        &mut self,
        req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        flags: i32,
        lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let mut fs = self.0.lock().unwrap();
        io::read(&mut fs, req, ino, fh, offset, size, flags, lock_owner, reply);
    }

    fn write(
        &mut self,
        req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        write_flags: u32,
        flags: i32,
        lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let mut fs = self.0.lock().unwrap();
        io::write(&mut fs, req, ino, fh, offset, data, write_flags, flags, lock_owner, reply);
    }

    fn release(
        &mut self,
        req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        flags: i32,
        lock_owner: Option<u64>,
        flush: bool,
        reply: ReplyEmpty,
    ) {
        let mut fs = self.0.lock().unwrap();
        io::release(&mut fs, req, ino, fh, flags, lock_owner, flush, reply);
    }

    fn flush(&mut self, req: &fuser::Request<'_>, ino: u64, fh: u64, lock_owner: u64, reply: ReplyEmpty) {
        let mut fs = self.0.lock().unwrap();
        io::flush(&mut fs, req, ino, fh, lock_owner, reply);
    }

    fn fsync(&mut self, req: &fuser::Request<'_>, ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
        let mut fs = self.0.lock().unwrap();
        io::fsync(&mut fs, req, ino, fh, datasync, reply);
    }

    fn create(
        &mut self,
        req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        let mut fs = self.0.lock().unwrap();
        create::create(&mut fs, req, parent, name, mode, umask, flags, reply);
    }

    fn mkdir(&mut self, req: &fuser::Request<'_>, parent: u64, name: &OsStr, mode: u32, umask: u32, reply: ReplyEntry) {
        let mut fs = self.0.lock().unwrap();
        create::mkdir(&mut fs, req, parent, name, mode, umask, reply);
    }

    fn unlink(&mut self, req: &fuser::Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let mut fs = self.0.lock().unwrap();
        delete::unlink(&mut fs, req, parent, name, reply);
    }

    fn rmdir(&mut self, req: &fuser::Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let mut fs = self.0.lock().unwrap();
        delete::rmdir(&mut fs, req, parent, name, reply);
    }

    fn rename(
        &mut self,
        req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        let mut fs = self.0.lock().unwrap();
        rename::rename(&mut fs, req, parent, name, newparent, newname, flags, reply);
    }

    fn getxattr(&mut self, req: &fuser::Request, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        let mut fs = self.0.lock().unwrap();
        xattr::getxattr(&mut fs, req, ino, name, size, reply);
    }

    fn setxattr(
        &mut self,
        req: &fuser::Request,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        flags: i32,
        position: u32,
        reply: ReplyEmpty,
    ) {
        let mut fs = self.0.lock().unwrap();
        xattr::setxattr(&mut fs, req, ino, name, value, flags, position, reply);
    }

    fn listxattr(&mut self, req: &fuser::Request, ino: u64, size: u32, reply: ReplyXattr) {
        let mut fs = self.0.lock().unwrap();
        xattr::listxattr(&mut fs, req, ino, size, reply);
    }

    fn removexattr(&mut self, req: &fuser::Request, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        let mut fs = self.0.lock().unwrap();
        xattr::removexattr(&mut fs, req, ino, name, reply);
    }
}
