use super::prelude::*;
use fuser::ReplyXattr;

/// Extended attributes are a best-effort, always-empty diagnostic surface
/// (§4.4, §9): the design allows wiring an xattr-based error channel here,
/// but this rewrite keeps it as harmless no-ops since that channel is
/// explicitly optional.
pub fn getxattr(_fs: &mut RemoteFs, _req: &Request, _ino: u64, _name: &OsStr, _size: u32, reply: ReplyXattr) {
    #[cfg(target_os = "macos")]
    reply.error(ENOATTR);

    #[cfg(not(target_os = "macos"))]
    reply.error(ENODATA);
}

pub fn setxattr(_fs: &mut RemoteFs, _req: &Request, _ino: u64, _name: &OsStr, _value: &[u8], _flags: i32, _position: u32, reply: ReplyEmpty) {
    reply.ok();
}

pub fn listxattr(_fs: &mut RemoteFs, _req: &Request, _ino: u64, size: u32, reply: ReplyXattr) {
    if size == 0 {
        reply.size(0);
    } else {
        reply.data(&[]);
    }
}

pub fn removexattr(_fs: &mut RemoteFs, _req: &Request, _ino: u64, _name: &OsStr, reply: ReplyEmpty) {
    reply.ok();
}
