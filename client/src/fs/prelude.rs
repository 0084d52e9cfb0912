//! Shared imports for the `fs` sub-modules, mirroring the teacher's own
//! prelude pattern so each operation file stays free of repetitive `use`s.

pub use fuser::{
    FileAttr, FileType, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};

pub use libc::{EACCES, EBADF, EEXIST, EIO, ENOENT, ENOTEMPTY, ENOSYS};
#[cfg(not(target_os = "macos"))]
pub use libc::ENODATA;
#[cfg(target_os = "macos")]
pub use libc::ENOATTR;

pub use std::ffi::OsStr;
pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use tracing::{debug, warn};

pub use crate::classify::Classification;
pub use crate::error::WikiError;

pub use super::{root_dir_attr, OpenHandle, RemoteFs, ROOT_INO};

/// Converts a `WikiError` to the libc errno carried by a FUSE reply.
pub fn errno_of(e: &WikiError) -> libc::c_int {
    e.errno()
}
