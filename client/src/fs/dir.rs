use super::attr::local_metadata_to_file_attr;
use super::prelude::*;
use fuser::{ReplyDirectory, ReplyEntry, ReplyOpen};
use std::fs::OpenOptions;

pub fn lookup(fs: &mut RemoteFs, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
    let Some(parent_path) = fs.inode_to_path.get(&parent).cloned() else {
        reply.error(ENOENT);
        return;
    };
    let Some(name_str) = name.to_str() else {
        reply.error(ENOENT);
        return;
    };
    let full_path = RemoteFs::join_path(&parent_path, name_str);

    match RemoteFs::classify(&full_path) {
        Classification::Wiki => match fs.runtime.block_on(fs.client.getattr(&full_path)) {
            Ok(stat) => {
                let ino = fs.inode_for(&full_path, FileType::RegularFile);
                let attr = super::attr::stat_to_file_attr(ino, stat, FileType::RegularFile);
                reply.entry(&fs.entry_ttl(), &attr, 0);
            }
            Err(e) => reply.error(errno_of(&e)),
        },
        Classification::Local => {
            let local_path = fs.local_fs_path(&full_path);
            match std::fs::symlink_metadata(&local_path) {
                Ok(meta) => {
                    let kind = if meta.is_dir() { FileType::Directory } else { FileType::RegularFile };
                    let ino = fs.inode_for(&full_path, kind);
                    let attr = local_metadata_to_file_attr(ino, &meta, kind);
                    reply.entry(&fs.entry_ttl(), &attr, 0);
                }
                Err(_) => reply.error(ENOENT),
            }
        }
    }
}

/// Lists the union of the server's `_`-prefixed wiki entries and the local
/// directory's own entries (excluding the mirror-cache scratch directory),
/// lazily creating the local directory so it has a surface the kernel can
/// `lstat` (§4.4).
pub fn readdir(fs: &mut RemoteFs, _req: &Request, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
    let Some(dir_path) = fs.inode_to_path.get(&ino).cloned() else {
        reply.error(ENOENT);
        return;
    };

    let mut entries: Vec<(u64, FileType, String)> = Vec::new();
    if offset == 0 {
        entries.push((ino, FileType::Directory, ".".to_string()));
        let parent_ino = if ino == ROOT_INO {
            ROOT_INO
        } else {
            let parent_path = dir_path.rsplit_once('/').map_or("", |(p, _)| p);
            *fs.path_to_inode.get(parent_path).unwrap_or(&ROOT_INO)
        };
        entries.push((parent_ino, FileType::Directory, "..".to_string()));
    }

    if offset < 2 {
        let local_dir = fs.local_fs_path(&dir_path);
        if let Err(e) = std::fs::create_dir_all(&local_dir) {
            warn!(path = %dir_path, error = %e, "could not lazily create local directory surface");
        }

        let wiki_names = fs
            .runtime
            .block_on(fs.client.readdir(&dir_path))
            .unwrap_or_default();
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

        for name in wiki_names {
            let full_path = RemoteFs::join_path(&dir_path, &name);
            let inode = fs.inode_for(&full_path, FileType::RegularFile);
            entries.push((inode, FileType::RegularFile, name.clone()));
            seen.insert(name);
        }

        if let Ok(read_dir) = std::fs::read_dir(&local_dir) {
            for entry in read_dir.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name == ".wikifs-mirror" || seen.contains(&name) {
                    continue;
                }
                let Ok(meta) = entry.metadata() else { continue };
                let kind = if meta.is_dir() { FileType::Directory } else { FileType::RegularFile };
                let full_path = RemoteFs::join_path(&dir_path, &name);
                let inode = fs.inode_for(&full_path, kind);
                entries.push((inode, kind, name));
            }
        }
    }

    for (i, (ino_to_add, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
        if reply.add(ino_to_add, (i + 1) as i64, kind, &name) {
            break;
        }
    }
    reply.ok();
}

fn open_options_from_flags(flags: i32) -> OpenOptions {
    let mut opts = OpenOptions::new();
    match flags & libc::O_ACCMODE {
        libc::O_WRONLY => {
            opts.write(true);
        }
        libc::O_RDWR => {
            opts.read(true).write(true);
        }
        _ => {
            opts.read(true);
        }
    }
    if flags & libc::O_APPEND != 0 {
        opts.append(true);
    }
    if flags & libc::O_TRUNC != 0 {
        opts.truncate(true);
    }
    opts
}

pub fn open(fs: &mut RemoteFs, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
    let Some(path) = fs.inode_to_path.get(&ino).cloned() else {
        reply.error(ENOENT);
        return;
    };

    let is_wiki = RemoteFs::classify(&path) == Classification::Wiki;
    let backing = if is_wiki {
        match fs.mirror.acquire(&fs.client, &fs.runtime, &path) {
            Ok((p, _mode)) => p,
            Err(e) => {
                reply.error(errno_of(&e));
                return;
            }
        }
    } else {
        fs.local_fs_path(&path)
    };

    match open_options_from_flags(flags).open(&backing) {
        Ok(file) => {
            let fh = fs.next_fh;
            fs.next_fh += 1;
            fs.open_files.insert(fh, OpenHandle { file, path, is_wiki });
            reply.opened(fh, 0);
        }
        Err(e) => {
            if is_wiki {
                let _ = fs.mirror.release(&fs.client, &fs.runtime, &path);
            }
            reply.error(e.raw_os_error().unwrap_or(EIO));
        }
    }
}
