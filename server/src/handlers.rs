//! HTTP API surface (C7): the `/wikifs/*` endpoints in §6.1.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::lock::LockManager;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::instrument;

#[derive(Deserialize)]
pub struct PathQuery {
    path: String,
}

#[derive(Serialize)]
pub struct StatDto {
    size: u64,
    atime: i64,
    mtime: i64,
    ctime: i64,
    nlink: u32,
    uid: u32,
    gid: u32,
    st_mode: u32,
}

#[derive(Serialize)]
pub struct DownloadResponse {
    content: String,
    lock_is_yours: bool,
    st_mode: u32,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    content: String,
}

#[derive(Deserialize)]
pub struct ChmodRequest {
    mode: u32,
}

#[derive(Deserialize)]
pub struct RenameRequest {
    new_path: String,
}

fn safe_join(root: &std::path::Path, rel: &str) -> Result<PathBuf, ApiError> {
    if rel.split('/').any(|seg| seg == "..") {
        return Err(ApiError::PermissionDenied);
    }
    Ok(root.join(rel))
}

fn synthesized_mode(lock_is_yours: bool) -> u32 {
    if lock_is_yours {
        0o100664
    } else {
        0o100444
    }
}

fn stat_dto(meta: &std::fs::Metadata, lock_is_yours: bool) -> StatDto {
    use std::os::unix::fs::MetadataExt;
    let to_secs = |t: std::io::Result<std::time::SystemTime>| {
        t.ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    };
    StatDto {
        size: meta.len(),
        atime: to_secs(meta.accessed()),
        mtime: to_secs(meta.modified()),
        ctime: meta.ctime(),
        nlink: meta.nlink() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        st_mode: synthesized_mode(lock_is_yours),
    }
}

#[instrument(skip(state, user))]
pub async fn getattr(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
) -> Result<Json<StatDto>, ApiError> {
    let file_path = safe_join(&state.root, &q.path)?;
    let meta = std::fs::metadata(&file_path).map_err(|_| ApiError::NotFound)?;
    let lock_is_yours = state.locks.user_has_lock(&q.path, &user.username)?;
    Ok(Json(stat_dto(&meta, lock_is_yours)))
}

#[instrument(skip(state, _user))]
pub async fn readdir(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<PathQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let dir_path = safe_join(&state.root, &q.path)?;
    let mut names = Vec::new();
    if let Ok(entries) = std::fs::read_dir(&dir_path) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('_') && !LockManager::is_lock_file(&name) {
                names.push(name);
            }
        }
    }
    Ok(Json(names))
}

#[instrument(skip(state, user))]
pub async fn download(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let file_path = safe_join(&state.root, &q.path)?;
    let bytes = std::fs::read(&file_path).map_err(|_| ApiError::NotFound)?;
    let lock_is_yours = state.locks.user_has_lock(&q.path, &user.username)?;
    Ok(Json(DownloadResponse {
        content: base64::engine::general_purpose::STANDARD.encode(bytes),
        lock_is_yours,
        st_mode: synthesized_mode(lock_is_yours),
    }))
}

/// Silently refused (403) when the caller no longer holds the lock, so the
/// client's mirror cache can correct itself on the next acquire (§6.1).
#[instrument(skip(state, user, body))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
    Json(body): Json<UploadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.locks.user_has_lock(&q.path, &user.username)? {
        return Err(ApiError::PermissionDenied);
    }
    let file_path = safe_join(&state.root, &q.path)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&body.content)
        .map_err(|e| ApiError::Io(e.to_string()))?;
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, bytes)?;
    Ok(Json(serde_json::json!({})))
}

#[instrument(skip(state, user))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let file_path = safe_join(&state.root, &q.path)?;
    if file_path.exists() {
        return Err(ApiError::Exists);
    }
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, [])?;
    state.locks.acquire(&q.path, &user.username)?;
    Ok(Json(serde_json::json!({})))
}

/// A set write bit acquires the lock; clearing all write bits commits the
/// working copy (if dirty) and releases it (§6.1).
#[instrument(skip(state, user, body))]
pub async fn chmod(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
    Json(body): Json<ChmodRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.mode & 0o222 != 0 {
        state.locks.acquire(&q.path, &user.username)?;
    } else {
        state.revisions.commit_if_dirty(&q.path, &user)?;
        state.locks.release(&q.path, &user.username)?;
    }
    Ok(Json(serde_json::json!({})))
}

#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let file_path = safe_join(&state.root, &q.path)?;
    if !file_path.exists() {
        return Err(ApiError::NotFound);
    }
    state.revisions.remove(&q.path, &user)?;
    state.locks.release(&q.path, &user.username)?;
    Ok(Json(serde_json::json!({})))
}

/// Acquires locks on both endpoints, records a rename revision, and releases
/// whichever lock the caller didn't already hold before the call (§4.4).
#[instrument(skip(state, user, body))]
pub async fn rename(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<PathQuery>,
    Json(body): Json<RenameRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let had_old = state.locks.user_has_lock(&q.path, &user.username)?;
    state.locks.acquire(&q.path, &user.username)?;
    state.revisions.rename(&q.path, &body.new_path, &user)?;
    state.locks.rename(&q.path, &body.new_path)?;
    if !had_old {
        state.locks.release(&body.new_path, &user.username)?;
    }
    Ok(Json(serde_json::json!({})))
}
