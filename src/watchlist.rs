//! Local watchlist storage
//!
//! Single-user list of saved movies and TV shows, kept as a JSON file with
//! one list per media type. Stored at ~/.local/share/cinedeck/watchlist.json
//! unless configured otherwise. No sync, no sharing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{MediaType, WatchlistItem};

#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("Failed to write watchlist: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize watchlist: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WatchlistFile {
    #[serde(default)]
    movies: Vec<WatchlistItem>,
    #[serde(default)]
    tv_shows: Vec<WatchlistItem>,
}

impl WatchlistFile {
    fn items(&self, media: MediaType) -> &Vec<WatchlistItem> {
        match media {
            MediaType::Movie => &self.movies,
            MediaType::Tv => &self.tv_shows,
        }
    }

    fn items_mut(&mut self, media: MediaType) -> &mut Vec<WatchlistItem> {
        match media {
            MediaType::Movie => &mut self.movies,
            MediaType::Tv => &mut self.tv_shows,
        }
    }
}

/// File-backed watchlist
///
/// Changes only reach memory once they are on disk. A file that could not be
/// loaded is moved aside to `<name>.bak` before the first write replaces it.
#[derive(Debug)]
pub struct Watchlist {
    path: PathBuf,
    data: WatchlistFile,
    unreadable: bool,
}

impl Watchlist {
    /// Default location (~/.local/share/cinedeck/watchlist.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("cinedeck").join("watchlist.json"))
    }

    /// Load the watchlist; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| e.to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WatchlistFile::default()),
            Err(e) => Err(e.to_string()),
        };

        match loaded {
            Ok(data) => Self {
                path,
                data,
                unreadable: false,
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), "Error loading watchlist: {}", e);
                Self {
                    path,
                    data: WatchlistFile::default(),
                    unreadable: true,
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable file is kept before it is replaced
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "watchlist.json".into());
        name.push(".bak");
        self.path.with_file_name(name)
    }

    /// All items, movies first
    pub fn list(&self) -> Vec<WatchlistItem> {
        self.data
            .movies
            .iter()
            .chain(self.data.tv_shows.iter())
            .cloned()
            .collect()
    }

    pub fn list_by(&self, media: MediaType) -> &[WatchlistItem] {
        self.data.items(media)
    }

    pub fn contains(&self, id: &str, media: MediaType) -> bool {
        self.data.items(media).iter().any(|item| item.id == id)
    }

    /// Add an item; returns false when it was already saved
    pub fn add(&mut self, item: WatchlistItem) -> Result<bool, WatchlistError> {
        if self.contains(&item.id, item.media_type) {
            tracing::info!(
                "Item already in watchlist: {} ({})",
                item.title,
                item.media_type.as_path()
            );
            return Ok(false);
        }

        let mut next = self.data.clone();
        next.items_mut(item.media_type).push(item);
        self.commit(next)?;
        Ok(true)
    }

    /// Remove an item; returns false when nothing matched
    pub fn remove(&mut self, id: &str, media: MediaType) -> Result<bool, WatchlistError> {
        if !self.contains(id, media) {
            return Ok(false);
        }

        let mut next = self.data.clone();
        next.items_mut(media).retain(|item| item.id != id);
        self.commit(next)?;
        Ok(true)
    }

    /// Write `next` to disk, then make it the in-memory state
    fn commit(&mut self, next: WatchlistFile) -> Result<(), WatchlistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&next)?;

        if self.unreadable && self.path.exists() {
            let backup = self.backup_path();
            std::fs::rename(&self.path, &backup)?;
            tracing::warn!(backup = %backup.display(), "Moved unreadable watchlist aside");
        }
        self.unreadable = false;

        std::fs::write(&self.path, json)?;
        self.data = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, media_type: MediaType) -> WatchlistItem {
        WatchlistItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            poster_path: None,
            vote_average: 7.0,
            release_date: None,
            first_air_date: None,
            media_type,
        }
    }

    #[test]
    fn test_same_id_different_media_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = Watchlist::open(dir.path().join("w.json"));

        assert!(list.add(item("1", MediaType::Movie)).unwrap());
        assert!(list.add(item("1", MediaType::Tv)).unwrap());
        assert!(list.contains("1", MediaType::Movie));
        assert!(list.contains("1", MediaType::Tv));
        assert_eq!(list.list().len(), 2);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.json");
        std::fs::write(&path, "{not json").unwrap();

        let list = Watchlist::open(&path);
        assert!(list.list().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // Parent "directory" is a regular file, so nothing can be written
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut list = Watchlist::open(blocker.join("w.json"));

        assert!(list.add(item("1", MediaType::Movie)).is_err());
        assert!(!list.contains("1", MediaType::Movie));
        // A retry fails again instead of claiming the item is saved
        assert!(list.add(item("1", MediaType::Movie)).is_err());
        assert!(list.list().is_empty());
    }

    #[test]
    fn test_failed_remove_keeps_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.json");
        let mut list = Watchlist::open(&path);
        list.add(item("1", MediaType::Tv)).unwrap();

        // Replace the file with a directory so the write fails
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(list.remove("1", MediaType::Tv).is_err());
        assert!(list.contains("1", MediaType::Tv));
    }

    #[test]
    fn test_unreadable_file_kept_as_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        let original = r#"{"movies":[{"id":"1","title":"keep","media_type":"movie"}], BROKEN"#;
        std::fs::write(&path, original).unwrap();

        let mut list = Watchlist::open(&path);
        assert_eq!(list.backup_path(), dir.path().join("watchlist.json.bak"));
        assert!(list.add(item("2", MediaType::Movie)).unwrap());

        let backup = std::fs::read_to_string(list.backup_path()).unwrap();
        assert_eq!(backup, original);

        let reloaded = Watchlist::open(&path);
        assert!(reloaded.contains("2", MediaType::Movie));

        // Later writes do not touch the backup again
        assert!(list.add(item("3", MediaType::Movie)).unwrap());
        assert_eq!(std::fs::read_to_string(list.backup_path()).unwrap(), original);
    }

    #[test]
    fn test_remove_missing_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.json");
        let mut list = Watchlist::open(&path);

        assert!(!list.remove("9", MediaType::Movie).unwrap());
        assert!(!path.exists());
    }
}
