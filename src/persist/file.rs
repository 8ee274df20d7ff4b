// JSON file store. Writes go to a sibling temp file that is then renamed over
// the target, so readers see either the old snapshot or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::persist::snapshot;
use crate::persist::types::{PersistError, PersistResult, Snapshot};
use crate::persist::SnapshotStore;

pub struct JsonFileSnapshotStore {
    path: PathBuf,
    offset: FixedOffset, // timestamps are written in this offset
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        Self { path: path.into(), offset }
    }

    fn temp_path(&self) -> PersistResult<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| PersistError::InvalidPath(self.path.display().to_string()))?;
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(name);
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io { path: path.display().to_string(), source }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no snapshot file yet");
                return Ok(None);
            }
            Err(e) => return Err(io_err(&self.path)(e)),
        };
        snapshot::from_json(&text, self.offset)
    }

    #[instrument(skip(self, snap), fields(path = %self.path.display(), items = snap.items.len()))]
    async fn save_snapshot(&self, snap: &Snapshot) -> PersistResult<()> {
        let body = snapshot::to_json(snap, self.offset)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;
        }

        let tmp = self.temp_path()?;
        let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err(&tmp))?;
        file.write_all(body.as_bytes()).await.map_err(io_err(&tmp))?;
        file.write_all(b"\n").await.map_err(io_err(&tmp))?;
        file.sync_all().await.map_err(io_err(&tmp))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err(&self.path))?;
        info!("snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::types::NormalizedQuote;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn taipei() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn snapshot() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2025, 3, 3, 6, 0, 0).unwrap();
        let mut snap = Snapshot::new(at);
        snap.insert(NormalizedQuote {
            symbol: "2330.TW".into(),
            display_name: "台積電 2330".into(),
            latest_price: Some(dec!(1000)),
            previous_close: Some(dec!(990.5)),
            fetched_at: at,
        });
        snap
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("quotes.json"), taipei());
        assert_eq!(store.load_snapshot().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("data").join("quotes.json"), taipei());
        store.save_snapshot(&snapshot()).await.unwrap();
        assert_eq!(store.load_snapshot().await.unwrap(), Some(snapshot()));

        // only the target is left behind
        let names: Vec<_> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["quotes.json".to_string()]);
    }

    #[tokio::test]
    async fn test_save_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, "{\"fetched_at\": \"old\", \"items\": {\"X\": {}}, \"padding\": \"".to_string() + &"x".repeat(4096) + "\"}").unwrap();
        let store = JsonFileSnapshotStore::new(&path, taipei());
        store.save_snapshot(&snapshot()).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert!(loaded.get("X").is_none());
        assert_eq!(loaded.items.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, "{\"fetched_at\": ").unwrap();
        let store = JsonFileSnapshotStore::new(&path, taipei());
        assert!(matches!(store.load_snapshot().await, Err(PersistError::Serialization(_))));
    }
}
