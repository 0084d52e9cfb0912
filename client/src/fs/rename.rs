use super::prelude::*;

/// The four cases are dictated by the classification of each endpoint
/// (§4.4). The two same-domain cases are a single remote/local call; the two
/// cross-domain cases share the non-atomic copy-then-unlink fallback.
pub fn rename(
    fs: &mut RemoteFs,
    _req: &Request<'_>,
    parent: u64,
    name: &OsStr,
    newparent: u64,
    newname: &OsStr,
    _flags: u32,
    reply: ReplyEmpty,
) {
    let Some(old_parent_path) = fs.inode_to_path.get(&parent).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let Some(new_parent_path) = fs.inode_to_path.get(&newparent).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let (Some(old_name), Some(new_name)) = (name.to_str(), newname.to_str()) else {
        reply.error(ENOENT);
        return;
    };

    let old_path = RemoteFs::join_path(&old_parent_path, old_name);
    let new_path = RemoteFs::join_path(&new_parent_path, new_name);

    let old_class = RemoteFs::classify(&old_path);
    let new_class = RemoteFs::classify(&new_path);

    let result = match (old_class, new_class) {
        (Classification::Local, Classification::Local) => {
            let old_local = fs.local_fs_path(&old_path);
            let new_local = fs.local_fs_path(&new_path);
            std::fs::rename(&old_local, &new_local).map_err(|e| e.raw_os_error().unwrap_or(EIO))
        }
        (Classification::Wiki, Classification::Wiki) => {
            fs.runtime
                .block_on(fs.client.rename(&old_path, &new_path))
                .map_err(|e| errno_of(&e))
        }
        _ => cross_domain_rename(fs, &old_path, old_class, &new_path, new_class),
    };

    match result {
        Ok(()) => {
            fs.mirror.forget(&old_path);
            if let Some(ino) = fs.path_to_inode.remove(&old_path) {
                fs.path_to_inode.insert(new_path.clone(), ino);
                fs.inode_to_path.insert(ino, new_path);
            }
            reply.ok();
        }
        Err(errno) => reply.error(errno),
    }
}

/// Cross-domain rename has no atomic primitive to lean on: create the
/// destination writable, copy bytes, settle its final mode, then unlink the
/// source. A failed final unlink is logged rather than failing the call,
/// since the copy already succeeded and the duplicate is recoverable by an
/// operator (§9).
fn cross_domain_rename(
    fs: &mut RemoteFs,
    old_path: &str,
    old_class: Classification,
    new_path: &str,
    new_class: Classification,
) -> Result<(), libc::c_int> {
    if fs.mirror.is_open(old_path) || fs.mirror.is_open(new_path) {
        return Err(libc::EBUSY);
    }

    let source_mode = read_mode(fs, old_path, old_class)?;
    let content = read_bytes(fs, old_path, old_class)?;

    // For a wiki destination the final chmod is not just a permission bit:
    // clearing the write bits is what tells the server to commit and release
    // the lock (handlers.rs interprets any write bit as "acquire"). A local
    // source file's mode almost always has its owner-write bit set, so the
    // source mode can't be forwarded as-is — mask the write bits off instead
    // of restoring them verbatim.
    let final_mode = match new_class {
        Classification::Wiki => source_mode & 0o777 & !0o222,
        Classification::Local => source_mode & 0o777,
    };

    create_destination(fs, new_path, new_class)?;
    chmod_path(fs, new_path, new_class, 0o666)?;
    write_bytes(fs, new_path, new_class, &content)?;
    chmod_path(fs, new_path, new_class, final_mode)?;

    match unlink_path(fs, old_path, old_class) {
        Ok(()) => Ok(()),
        Err(errno) => {
            warn!(
                old_path, new_path,
                "cross-domain rename: destination written but source unlink failed, leaving a duplicate"
            );
            Err(errno)
        }
    }
}

fn read_mode(fs: &mut RemoteFs, path: &str, class: Classification) -> Result<u32, libc::c_int> {
    match class {
        Classification::Wiki => fs
            .runtime
            .block_on(fs.client.getattr(path))
            .map(|s| s.st_mode)
            .map_err(|e| errno_of(&e)),
        Classification::Local => std::fs::symlink_metadata(fs.local_fs_path(path))
            .map(|m| std::os::unix::fs::MetadataExt::mode(&m))
            .map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}

fn read_bytes(fs: &mut RemoteFs, path: &str, class: Classification) -> Result<Vec<u8>, libc::c_int> {
    match class {
        Classification::Wiki => {
            let resp = fs.runtime.block_on(fs.client.download(path)).map_err(|e| errno_of(&e))?;
            crate::api_client::decode_content(&resp.content).map_err(|e| errno_of(&e))
        }
        Classification::Local => std::fs::read(fs.local_fs_path(path)).map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}

fn create_destination(fs: &mut RemoteFs, path: &str, class: Classification) -> Result<(), libc::c_int> {
    match class {
        Classification::Wiki => fs.runtime.block_on(fs.client.create(path)).map_err(|e| errno_of(&e)),
        Classification::Local => std::fs::File::create(fs.local_fs_path(path))
            .map(|_| ())
            .map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}

fn chmod_path(fs: &mut RemoteFs, path: &str, class: Classification, mode: u32) -> Result<(), libc::c_int> {
    match class {
        Classification::Wiki => fs.runtime.block_on(fs.client.chmod(path, mode)).map_err(|e| errno_of(&e)),
        Classification::Local => std::fs::set_permissions(fs.local_fs_path(path), std::os::unix::fs::PermissionsExt::from_mode(mode))
            .map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}

fn write_bytes(fs: &mut RemoteFs, path: &str, class: Classification, bytes: &[u8]) -> Result<(), libc::c_int> {
    match class {
        Classification::Wiki => fs.runtime.block_on(fs.client.upload(path, bytes)).map_err(|e| errno_of(&e)),
        Classification::Local => std::fs::write(fs.local_fs_path(path), bytes).map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}

fn unlink_path(fs: &mut RemoteFs, path: &str, class: Classification) -> Result<(), libc::c_int> {
    match class {
        Classification::Wiki => fs.runtime.block_on(fs.client.remove(path)).map_err(|e| errno_of(&e)),
        Classification::Local => std::fs::remove_file(fs.local_fs_path(path)).map_err(|e| e.raw_os_error().unwrap_or(EIO)),
    }
}
