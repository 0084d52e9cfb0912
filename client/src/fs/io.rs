use super::prelude::*;
use fuser::{ReplyData, ReplyWrite};
use std::io::{Read, Seek, SeekFrom, Write as _};

/// Both `read` and `write` serialize their seek+transfer pair through the
/// process-wide `io_lock`, so concurrent kernel threads can't interleave a
/// seek from one call with a transfer from another (§5).
pub fn read(
    fs: &mut RemoteFs,
    _req: &Request<'_>,
    _ino: u64,
    fh: u64,
    offset: i64,
    size: u32,
    _flags: i32,
    _lock_owner: Option<u64>,
    reply: ReplyData,
) {
    let _guard = fs.io_lock.lock().unwrap();
    let Some(handle) = fs.open_files.get_mut(&fh) else {
        reply.error(EBADF);
        return;
    };

    if handle.file.seek(SeekFrom::Start(offset as u64)).is_err() {
        reply.error(EIO);
        return;
    }

    let mut buf = vec![0u8; size as usize];
    match handle.file.read(&mut buf) {
        Ok(n) => reply.data(&buf[..n]),
        Err(_) => reply.error(EIO),
    }
}

pub fn write(
    fs: &mut RemoteFs,
    _req: &Request<'_>,
    _ino: u64,
    fh: u64,
    offset: i64,
    data: &[u8],
    _write_flags: u32,
    _flags: i32,
    _lock_owner: Option<u64>,
    reply: ReplyWrite,
) {
    let _guard = fs.io_lock.lock().unwrap();
    let Some(handle) = fs.open_files.get_mut(&fh) else {
        reply.error(EBADF);
        return;
    };

    if handle.file.seek(SeekFrom::Start(offset as u64)).is_err() {
        reply.error(EIO);
        return;
    }

    match handle.file.write(data) {
        Ok(n) => reply.written(n as u32),
        Err(_) => reply.error(EIO),
    }
}

/// Closing a wiki handle triggers the mirror release, which uploads iff the
/// backing file's mtime moved since the last sync point.
pub fn release(
    fs: &mut RemoteFs,
    _req: &Request<'_>,
    _ino: u64,
    fh: u64,
    _flags: i32,
    _lock_owner: Option<u64>,
    _flush: bool,
    reply: ReplyEmpty,
) {
    let Some(handle) = fs.open_files.remove(&fh) else {
        reply.ok();
        return;
    };

    if handle.is_wiki {
        match fs.mirror.release(&fs.client, &fs.runtime, &handle.path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(errno_of(&e)),
        }
    } else {
        reply.ok();
    }
}

pub fn flush(fs: &mut RemoteFs, _req: &Request<'_>, _ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
    if let Some(handle) = fs.open_files.get(&fh) {
        let _ = handle.file.sync_all();
    }
    reply.ok();
}

pub fn fsync(fs: &mut RemoteFs, _req: &Request<'_>, _ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
    let Some(handle) = fs.open_files.get(&fh) else {
        reply.ok();
        return;
    };
    let result = if datasync { handle.file.sync_data() } else { handle.file.sync_all() };
    match result {
        Ok(()) => reply.ok(),
        Err(_) => reply.error(EIO),
    }
}
