//! Asynchronous HTTP client for the server's `/wikifs` API (C2).
//!
//! All functions here use `reqwest` and are called from within the Tokio
//! runtime (`runtime.block_on`) by the synchronous FUSE dispatch layer, the
//! same pattern the teacher used for its own `api_client.rs`.

use crate::error::WikiError;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// POSIX stat fields plus the synthesized mode, returned by `/getattr` and
/// embedded in `/download` responses (§6.1).
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct StatDto {
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub st_mode: u32,
}

#[derive(Deserialize, Debug)]
pub struct DownloadResponse {
    pub content: String,
    pub lock_is_yours: bool,
    pub st_mode: u32,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct ChmodRequest {
    mode: u32,
}

#[derive(Serialize)]
struct RenameRequest<'a> {
    new_path: &'a str,
}

#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RemoteClient {
    pub fn new(base_url: String, token: String) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            base_url,
            token,
        }
    }

    fn url(&self, endpoint: &str, path: &str) -> String {
        format!("{}/wikifs{endpoint}?path={}", self.base_url, urlencode(path))
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", &self.token)
    }

    async fn expect_ok(&self, resp: reqwest::Response) -> Result<reqwest::Response, WikiError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(WikiError::from_status(resp.status()))
        }
    }

    pub async fn getattr(&self, path: &str) -> Result<StatDto, WikiError> {
        let resp = self.auth(self.http.get(self.url("/getattr", path))).send().await?;
        let resp = self.expect_ok(resp).await?;
        Ok(resp.json::<StatDto>().await?)
    }

    pub async fn readdir(&self, path: &str) -> Result<Vec<String>, WikiError> {
        let resp = self.auth(self.http.get(self.url("/readdir", path))).send().await?;
        let resp = self.expect_ok(resp).await?;
        Ok(resp.json::<Vec<String>>().await?)
    }

    pub async fn download(&self, path: &str) -> Result<DownloadResponse, WikiError> {
        let resp = self.auth(self.http.get(self.url("/download", path))).send().await?;
        let resp = self.expect_ok(resp).await?;
        Ok(resp.json::<DownloadResponse>().await?)
    }

    pub async fn upload(&self, path: &str, content: &[u8]) -> Result<(), WikiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let resp = self
            .auth(self.http.post(self.url("/upload", path)))
            .json(&UploadRequest { content: &encoded })
            .send()
            .await?;
        self.expect_ok(resp).await?;
        Ok(())
    }

    pub async fn create(&self, path: &str) -> Result<(), WikiError> {
        let resp = self.auth(self.http.get(self.url("/create", path))).send().await?;
        self.expect_ok(resp).await?;
        Ok(())
    }

    pub async fn chmod(&self, path: &str, mode: u32) -> Result<(), WikiError> {
        let resp = self
            .auth(self.http.post(self.url("/chmod", path)))
            .json(&ChmodRequest { mode })
            .send()
            .await?;
        self.expect_ok(resp).await?;
        Ok(())
    }

    pub async fn remove(&self, path: &str) -> Result<(), WikiError> {
        let resp = self.auth(self.http.get(self.url("/remove", path))).send().await?;
        self.expect_ok(resp).await?;
        Ok(())
    }

    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), WikiError> {
        let resp = self
            .auth(self.http.post(self.url("/rename", old_path)))
            .json(&RenameRequest { new_path })
            .send()
            .await?;
        self.expect_ok(resp).await?;
        Ok(())
    }
}

pub fn decode_content(encoded: &str) -> Result<Vec<u8>, WikiError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| WikiError::Io(format!("invalid base64 from server: {e}")))
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
