use super::prelude::*;
use crate::api_client::StatDto;
use std::os::unix::fs::MetadataExt;

pub(crate) fn stat_to_file_attr(ino: u64, stat: StatDto, kind: FileType) -> FileAttr {
    FileAttr {
        ino,
        size: stat.size,
        blocks: (stat.size + 511) / 512,
        atime: UNIX_EPOCH + Duration::from_secs(stat.atime.max(0) as u64),
        mtime: UNIX_EPOCH + Duration::from_secs(stat.mtime.max(0) as u64),
        ctime: UNIX_EPOCH + Duration::from_secs(stat.ctime.max(0) as u64),
        crtime: UNIX_EPOCH,
        kind,
        perm: (stat.st_mode & 0o7777) as u16,
        nlink: stat.nlink,
        uid: stat.uid,
        gid: stat.gid,
        rdev: 0,
        flags: 0,
        blksize: 4096,
    }
}

pub(crate) fn local_metadata_to_file_attr(ino: u64, meta: &std::fs::Metadata, kind: FileType) -> FileAttr {
    FileAttr {
        ino,
        size: meta.len(),
        blocks: (meta.len() + 511) / 512,
        atime: meta.accessed().unwrap_or(UNIX_EPOCH),
        mtime: meta.modified().unwrap_or(UNIX_EPOCH),
        ctime: UNIX_EPOCH + Duration::from_secs(meta.ctime().max(0) as u64),
        crtime: UNIX_EPOCH,
        kind,
        perm: (meta.mode() & 0o7777) as u16,
        nlink: meta.nlink() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        rdev: 0,
        flags: 0,
        blksize: 4096,
    }
}

pub fn getattr(fs: &mut RemoteFs, _req: &Request, ino: u64, reply: ReplyAttr) {
    if ino == ROOT_INO {
        reply.attr(&fs.attr_ttl(), &root_dir_attr());
        return;
    }

    let Some(path) = fs.inode_to_path.get(&ino).cloned() else {
        reply.error(ENOENT);
        return;
    };

    match RemoteFs::classify(&path) {
        Classification::Wiki => match fs.runtime.block_on(fs.client.getattr(&path)) {
            Ok(stat) => reply.attr(&fs.attr_ttl(), &stat_to_file_attr(ino, stat, FileType::RegularFile)),
            Err(e) => reply.error(errno_of(&e)),
        },
        Classification::Local => {
            let local_path = fs.local_fs_path(&path);
            match std::fs::symlink_metadata(&local_path) {
                Ok(meta) => {
                    let kind = if meta.is_dir() { FileType::Directory } else { FileType::RegularFile };
                    reply.attr(&fs.attr_ttl(), &local_metadata_to_file_attr(ino, &meta, kind));
                }
                Err(_) => reply.error(ENOENT),
            }
        }
    }
}

/// `setattr` handles `chmod` (forwarded to the server for wiki paths, which
/// interprets a write bit as lock-acquire and its absence as release+commit)
/// and `truncate` (materialize, truncate the backing file, release).
pub fn setattr(
    fs: &mut RemoteFs,
    _req: &Request<'_>,
    ino: u64,
    mode: Option<u32>,
    _uid: Option<u32>,
    _gid: Option<u32>,
    size: Option<u64>,
    _atime: Option<TimeOrNow>,
    _mtime: Option<TimeOrNow>,
    _ctime: Option<SystemTime>,
    _fh: Option<u64>,
    _crtime: Option<SystemTime>,
    _chgtime: Option<SystemTime>,
    _bkuptime: Option<SystemTime>,
    _flags: Option<u32>,
    reply: ReplyAttr,
) {
    let Some(path) = fs.inode_to_path.get(&ino).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let is_wiki = RemoteFs::classify(&path) == Classification::Wiki;
    let local_path = fs.local_fs_path(&path);

    if let Some(new_mode) = mode {
        if is_wiki {
            if let Err(e) = fs.runtime.block_on(fs.client.chmod(&path, new_mode)) {
                reply.error(errno_of(&e));
                return;
            }
        } else if let Err(e) = std::fs::set_permissions(&local_path, std::os::unix::fs::PermissionsExt::from_mode(new_mode)) {
            reply.error(e.raw_os_error().unwrap_or(EIO));
            return;
        }
    }

    if let Some(new_size) = size {
        if is_wiki {
            let (backing_path, _mode) = match fs.mirror.acquire(&fs.client, &fs.runtime, &path) {
                Ok(v) => v,
                Err(e) => {
                    reply.error(errno_of(&e));
                    return;
                }
            };
            if let Err(e) = std::fs::OpenOptions::new().write(true).open(&backing_path).and_then(|f| f.set_len(new_size)) {
                reply.error(e.raw_os_error().unwrap_or(EIO));
                return;
            }
            if let Err(e) = fs.mirror.release(&fs.client, &fs.runtime, &path) {
                reply.error(errno_of(&e));
                return;
            }
        } else if let Err(e) = std::fs::OpenOptions::new().write(true).open(&local_path).and_then(|f| f.set_len(new_size)) {
            reply.error(e.raw_os_error().unwrap_or(EIO));
            return;
        }
    }

    getattr(fs, _req, ino, reply);
}
