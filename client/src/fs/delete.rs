use super::prelude::*;
use libc::EBUSY;

/// A wiki path must have refcount 0 (no open mirror) before it can be
/// unlinked (§4.4); violating that precondition fails with `EBUSY` rather
/// than racing the mirror cache.
pub fn unlink(fs: &mut RemoteFs, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
    let Some(parent_path) = fs.inode_to_path.get(&parent).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let Some(name_str) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let full_path = RemoteFs::join_path(&parent_path, name_str);

    if RemoteFs::classify(&full_path) == Classification::Wiki {
        if fs.mirror.is_open(&full_path) {
            reply.error(EBUSY);
            return;
        }
        if let Err(e) = fs.runtime.block_on(fs.client.remove(&full_path)) {
            reply.error(errno_of(&e));
            return;
        }
    } else {
        let local_path = fs.local_fs_path(&full_path);
        if let Err(e) = std::fs::remove_file(&local_path) {
            reply.error(e.raw_os_error().unwrap_or(EIO));
            return;
        }
    }

    if let Some(&ino) = fs.path_to_inode.get(&full_path) {
        fs.forget_inode(ino);
    }
    reply.ok();
}

/// Directories are always local; removal is a plain `rmdir` after an
/// emptiness check, matching POSIX `rmdir` semantics.
pub fn rmdir(fs: &mut RemoteFs, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
    let Some(parent_path) = fs.inode_to_path.get(&parent).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let Some(name_str) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let full_path = RemoteFs::join_path(&parent_path, name_str);
    let local_path = fs.local_fs_path(&full_path);

    match std::fs::read_dir(&local_path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                reply.error(ENOTEMPTY);
                return;
            }
        }
        Err(e) => {
            reply.error(e.raw_os_error().unwrap_or(ENOENT));
            return;
        }
    }

    if let Err(e) = std::fs::remove_dir(&local_path) {
        reply.error(e.raw_os_error().unwrap_or(EIO));
        return;
    }

    if let Some(&ino) = fs.path_to_inode.get(&full_path) {
        fs.forget_inode(ino);
    }
    reply.ok();
}
