use super::attr::{local_metadata_to_file_attr, stat_to_file_attr};
use super::prelude::*;
use fuser::{ReplyCreate, ReplyEntry};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

/// `create` for a wiki path acquires the server lock and an empty file via
/// the `create` endpoint, then materializes the mirror and opens it
/// `O_WRONLY|O_TRUNC` so the caller writes straight into the backing file.
pub fn create(
    fs: &mut RemoteFs,
    req: &Request<'_>,
    parent: u64,
    name: &OsStr,
    mode: u32,
    _umask: u32,
    _flags: i32,
    reply: ReplyCreate,
) {
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
        if let Err(e) = fs.runtime.block_on(fs.client.create(&full_path)) {
            reply.error(errno_of(&e));
            return;
        }

        let backing_path = match fs.mirror.acquire(&fs.client, &fs.runtime, &full_path) {
            Ok((p, _mode)) => p,
            Err(e) => {
                reply.error(errno_of(&e));
                return;
            }
        };

        let file = match OpenOptions::new().write(true).truncate(true).open(&backing_path) {
            Ok(f) => f,
            Err(e) => {
                reply.error(e.raw_os_error().unwrap_or(EIO));
                return;
            }
        };

        let fh = fs.next_fh;
        fs.next_fh += 1;
        fs.open_files.insert(fh, OpenHandle { file, path: full_path.clone(), is_wiki: true });

        let ino = fs.inode_for(&full_path, FileType::RegularFile);
        match fs.runtime.block_on(fs.client.getattr(&full_path)) {
            Ok(stat) => reply.created(&fs.entry_ttl(), &stat_to_file_attr(ino, stat, FileType::RegularFile), 0, fh, 0),
            Err(e) => reply.error(errno_of(&e)),
        }
        return;
    }

    let local_path = fs.local_fs_path(&full_path);
    let file = match OpenOptions::new().create(true).write(true).truncate(true).mode(mode).open(&local_path) {
        Ok(f) => f,
        Err(e) => {
            reply.error(e.raw_os_error().unwrap_or(EIO));
            return;
        }
    };

    let fh = fs.next_fh;
    fs.next_fh += 1;

    let ino = fs.inode_for(&full_path, FileType::RegularFile);
    let attr = match file.metadata() {
        Ok(meta) => local_metadata_to_file_attr(ino, &meta, FileType::RegularFile),
        Err(e) => {
            reply.error(e.raw_os_error().unwrap_or(EIO));
            return;
        }
    };
    fs.open_files.insert(fh, OpenHandle { file, path: full_path, is_wiki: false });
    let _ = req.uid();
    reply.created(&fs.entry_ttl(), &attr, 0, fh, 0);
}

/// Directories are always local (§4.4): wiki paths name files, never dirs.
pub fn mkdir(fs: &mut RemoteFs, _req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, _umask: u32, reply: ReplyEntry) {
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

    if let Err(e) = std::fs::create_dir(&local_path) {
        reply.error(e.raw_os_error().unwrap_or(EIO));
        return;
    }
    let _ = std::fs::set_permissions(&local_path, std::os::unix::fs::PermissionsExt::from_mode(mode));

    let ino = fs.inode_for(&full_path, FileType::Directory);
    match std::fs::symlink_metadata(&local_path) {
        Ok(meta) => reply.entry(&fs.entry_ttl(), &local_metadata_to_file_attr(ino, &meta, FileType::Directory), 0),
        Err(e) => reply.error(e.raw_os_error().unwrap_or(EIO)),
    }
}
