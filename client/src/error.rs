//! Typed error taxonomy for the client (§7, §10.2 of SPEC_FULL.md).
//!
//! `WikiError` is the single currency every remote call and mirror-cache
//! operation returns. The FUSE dispatch layer is the only place that converts
//! it down to a libc errno.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("permission denied")]
    PermissionDenied,
    #[error("already exists")]
    Exists,
    #[error("locked by another user")]
    LockedByOther,
    #[error("io error: {0}")]
    Io(String),
}

impl WikiError {
    /// Maps an error kind to the POSIX errno the FUSE reply carries, per §7.
    pub fn errno(&self) -> libc::c_int {
        match self {
            WikiError::NotFound => libc::ENOENT,
            WikiError::Unauthorized => libc::EACCES,
            WikiError::PermissionDenied => libc::EACCES,
            WikiError::Exists => libc::EEXIST,
            WikiError::LockedByOther => libc::EACCES,
            WikiError::Io(_) => libc::EIO,
        }
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            404 => WikiError::NotFound,
            401 => WikiError::Unauthorized,
            403 => WikiError::PermissionDenied,
            409 => WikiError::Exists,
            410 => WikiError::LockedByOther,
            other => WikiError::Io(format!("unexpected status {other}")),
        }
    }
}

impl From<reqwest::Error> for WikiError {
    fn from(e: reqwest::Error) -> Self {
        WikiError::Io(e.to_string())
    }
}

impl From<std::io::Error> for WikiError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => WikiError::NotFound,
            std::io::ErrorKind::PermissionDenied => WikiError::PermissionDenied,
            _ => WikiError::Io(e.to_string()),
        }
    }
}
