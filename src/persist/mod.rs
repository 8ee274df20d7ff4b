pub mod types;
pub use types::*;
pub mod file;
pub mod snapshot;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    // Ok(None) = nothing usable on disk yet ("awaiting data")
    async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>>;
    async fn save_snapshot(&self, snapshot: &Snapshot) -> PersistResult<()>;
}
