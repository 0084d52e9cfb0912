//! Server user database (C9): `users.db` is one `username token` pair per
//! line, loaded at startup and reloaded once on a token lookup miss (§4.7).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub token: String,
}

impl User {
    /// The identity `git commit` records for this user's revisions.
    pub fn commit_identity(&self) -> (String, String) {
        (self.username.clone(), format!("{}@wikifs.local", self.username))
    }
}

pub struct UserDb {
    path: PathBuf,
    users: RwLock<HashMap<String, User>>,
}

fn parse_users_db(text: &str) -> HashMap<String, User> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(username), Some(token)) = (parts.next(), parts.next()) else {
            continue;
        };
        map.insert(
            token.to_string(),
            User { username: username.to_string(), token: token.to_string() },
        );
    }
    map
}

impl UserDb {
    pub fn load(wikifs_root: &Path) -> std::io::Result<Self> {
        let path = wikifs_root.join("users.db");
        let users = if path.exists() {
            parse_users_db(&std::fs::read_to_string(&path)?)
        } else {
            HashMap::new()
        };
        Ok(Self { path, users: RwLock::new(users) })
    }

    fn reload(&self) -> std::io::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let text = std::fs::read_to_string(&self.path)?;
        *self.users.write().unwrap() = parse_users_db(&text);
        Ok(())
    }

    pub fn lookup(&self, token: &str) -> Option<User> {
        if let Some(user) = self.users.read().unwrap().get(token).cloned() {
            return Some(user);
        }
        let _ = self.reload();
        self.users.read().unwrap().get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_blank_and_comment_lines() {
        let map = parse_users_db("# comment\n\nalice tok-a\nbob tok-b\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("tok-a").unwrap().username, "alice");
    }

    #[test]
    fn lookup_reloads_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.db"), "alice tok-a\n").unwrap();
        let db = UserDb::load(dir.path()).unwrap();
        assert!(db.lookup("tok-b").is_none());

        std::fs::write(dir.path().join("users.db"), "alice tok-a\nbob tok-b\n").unwrap();
        let user = db.lookup("tok-b").expect("reload should pick up new token");
        assert_eq!(user.username, "bob");
    }
}
