//! Client configuration loader (C8). INI file, section `[wikifs]`.
//!
//! The original Python implementation parsed this same file shape with
//! Python's `configparser` module; the crate of the same name is the nearest
//! idiomatic Rust equivalent, so it replaces the teacher's `toml`-based
//! loader here.

use configparser::ini::Ini;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub local_root: PathBuf,
    pub server_url: String,
    pub auth_token: String,
    pub kernel_attr_timeout_seconds: u64,
    pub kernel_entry_timeout_seconds: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not parse config file {0}: {1}")]
    Parse(PathBuf, String),
    #[error("missing required key `{0}` in [wikifs] section")]
    MissingKey(&'static str),
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

        let local_root = ini
            .get("wikifs", "local_root")
            .ok_or(ConfigError::MissingKey("local_root"))?;
        let server_url = ini
            .get("wikifs", "server_url")
            .ok_or(ConfigError::MissingKey("server_url"))?;
        let auth_token = ini
            .get("wikifs", "auth_token")
            .ok_or(ConfigError::MissingKey("auth_token"))?;

        let kernel_attr_timeout_seconds = ini
            .getuint("wikifs", "kernel_attr_timeout_seconds")
            .ok()
            .flatten()
            .unwrap_or(1);
        let kernel_entry_timeout_seconds = ini
            .getuint("wikifs", "kernel_entry_timeout_seconds")
            .ok()
            .flatten()
            .unwrap_or(1);

        Ok(Config {
            local_root: PathBuf::from(local_root),
            server_url: server_url.trim_end_matches('/').to_string(),
            auth_token,
            kernel_attr_timeout_seconds,
            kernel_entry_timeout_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_required_keys_and_defaults_timeouts() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[wikifs]\nlocal_root = /tmp/wiki\nserver_url = http://localhost:5002\nauth_token = abc123\n"
        )
        .unwrap();

        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.local_root, PathBuf::from("/tmp/wiki"));
        assert_eq!(cfg.server_url, "http://localhost:5002");
        assert_eq!(cfg.auth_token, "abc123");
        assert_eq!(cfg.kernel_attr_timeout_seconds, 1);
        assert_eq!(cfg.kernel_entry_timeout_seconds, 1);
    }

    #[test]
    fn strips_trailing_slash_from_server_url() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[wikifs]\nlocal_root = /tmp/wiki\nserver_url = http://localhost:5002/\nauth_token = abc123\n"
        )
        .unwrap();
        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.server_url, "http://localhost:5002");
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[wikifs]\nlocal_root = /tmp/wiki\n").unwrap();
        assert!(Config::load(f.path()).is_err());
    }
}
