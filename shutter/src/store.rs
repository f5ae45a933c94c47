//! Persistent per-user like store.
//!
//! Keys follow `likes:{user}:{item}` and map to a [`LikeRecord`]. The file
//! backend loads lazily, keeps the map in memory and rewrites the whole file
//! on each mutation. Mutations are serialised within one process; two
//! processes sharing a file race with last-write-wins. A mutation reaches
//! the in-memory map only after the file write succeeded.
//!
//! `:` separates key parts, so it is rejected in user names and item ids.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, ShutterError};
use crate::types::LikeRecord;

/// Read-modify-write storage of liked item ids per user.
pub trait LikeStore: Send + Sync + 'static {
    /// Flip membership and return the new state.
    fn toggle(&self, user: &str, item_id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All item ids liked by `user`.
    fn list(&self, user: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Remove a like; removing an absent like is not an error.
    fn delete(&self, user: &str, item_id: &str) -> impl Future<Output = Result<()>> + Send;

    fn is_liked(&self, user: &str, item_id: &str) -> impl Future<Output = Result<bool>> + Send;
}

pub fn like_key(user: &str, item_id: &str) -> String {
    format!("likes:{user}:{item_id}")
}

fn user_prefix(user: &str) -> String {
    format!("likes:{user}:")
}

fn check_part(kind: &str, value: &str) -> Result<()> {
    if value.contains(':') {
        return Err(ShutterError::Validation(format!("{kind} must not contain ':'")));
    }
    Ok(())
}

fn check_key(user: &str, item_id: &str) -> Result<()> {
    check_part("user", user)?;
    check_part("item id", item_id)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

type LikeMap = BTreeMap<String, LikeRecord>;

/// Like store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileLikeStore {
    path: PathBuf,
    state: Mutex<Option<LikeMap>>,
}

impl JsonFileLikeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Result<LikeMap> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "like store absent, starting empty");
                Ok(LikeMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: &LikeMap) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Run `f` against a copy of the loaded map. If it reports a change the
    /// copy is written out and replaces the cached map; a failed write leaves
    /// the cache untouched.
    async fn with_map<T>(&self, f: impl FnOnce(&mut LikeMap) -> (T, bool)) -> Result<T> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            *guard = Some(Self::load(&self.path).await?);
        }
        let current = guard.get_or_insert_with(LikeMap::new);
        let mut next = current.clone();
        let (out, changed) = f(&mut next);
        if changed {
            self.save(&next).await?;
            *current = next;
        }
        Ok(out)
    }
}

impl LikeStore for JsonFileLikeStore {
    async fn toggle(&self, user: &str, item_id: &str) -> Result<bool> {
        check_key(user, item_id)?;
        let key = like_key(user, item_id);
        let liked = self
            .with_map(|map| {
                if map.remove(&key).is_some() {
                    (false, true)
                } else {
                    map.insert(key.clone(), LikeRecord { liked_at: now_ms() });
                    (true, true)
                }
            })
            .await?;
        debug!(user, item_id, liked, "like toggled");
        Ok(liked)
    }

    async fn list(&self, user: &str) -> Result<Vec<String>> {
        check_part("user", user)?;
        let prefix = user_prefix(user);
        self.with_map(|map| {
            let ids = map
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .map(str::to_string)
                .collect();
            (ids, false)
        })
        .await
    }

    async fn delete(&self, user: &str, item_id: &str) -> Result<()> {
        check_key(user, item_id)?;
        let key = like_key(user, item_id);
        self.with_map(|map| ((), map.remove(&key).is_some())).await
    }

    async fn is_liked(&self, user: &str, item_id: &str) -> Result<bool> {
        check_key(user, item_id)?;
        let key = like_key(user, item_id);
        self.with_map(|map| (map.contains_key(&key), false)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("shutter-store-{}-{name}", std::process::id()))
            .join("likes.json")
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_membership() {
        let path = temp_path("toggle");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileLikeStore::new(&path);

        assert!(store.toggle("muser1", "abc").await.unwrap());
        assert!(store.is_liked("muser1", "abc").await.unwrap());
        assert!(!store.toggle("muser1", "abc").await.unwrap());
        assert!(!store.is_liked("muser1", "abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_scoped_per_user_and_persisted() {
        let path = temp_path("list");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileLikeStore::new(&path);
        store.toggle("muser1", "a").await.unwrap();
        store.toggle("muser1", "b").await.unwrap();
        store.toggle("muser2", "c").await.unwrap();

        let reopened = JsonFileLikeStore::new(&path);
        assert_eq!(reopened.list("muser1").await.unwrap(), vec!["a", "b"]);
        assert_eq!(reopened.list("muser2").await.unwrap(), vec!["c"]);
        assert!(reopened.list("muser3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let path = temp_path("delete");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileLikeStore::new(&path);
        store.delete("muser1", "nope").await.unwrap();
        store.toggle("muser1", "x").await.unwrap();
        store.delete("muser1", "x").await.unwrap();
        assert!(!store.is_liked("muser1", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_membership_unchanged() {
        let path = temp_path("failed-write");
        let _ = std::fs::remove_dir_all(&path);
        let _ = std::fs::remove_file(&path);
        let store = JsonFileLikeStore::new(&path);
        assert!(store.toggle("muser1", "seed").await.unwrap());

        // Replace the file with a directory so every later write fails.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.toggle("muser1", "abc").await.is_err());
        assert!(!store.is_liked("muser1", "abc").await.unwrap());
        assert!(store.toggle("muser1", "seed").await.is_err());
        assert!(store.is_liked("muser1", "seed").await.unwrap());
        assert_eq!(store.list("muser1").await.unwrap(), vec!["seed"]);

        std::fs::remove_dir(&path).unwrap();
    }

    #[tokio::test]
    async fn test_separator_in_key_parts_rejected() {
        let path = temp_path("separator");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileLikeStore::new(&path);

        let err = store.toggle("a:b", "x").await.unwrap_err();
        assert!(matches!(err, ShutterError::Validation(_)));
        assert!(store.toggle("a", "b:x").await.is_err());
        assert!(store.list("a:b").await.is_err());
        assert!(store.list("a").await.unwrap().is_empty());
    }

    #[test]
    fn test_key_format() {
        assert_eq!(like_key("muser1", "abc"), "likes:muser1:abc");
    }
}
