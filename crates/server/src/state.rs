use std::{path::PathBuf, sync::Arc};
use tokio::sync::RwLock;
use transitnav::repository::Repository;

pub struct AppState {
    pub gtfs_data_path: PathBuf,
    /// The current timetable snapshot. Queries clone the `Arc` and run
    /// against it while a reload builds the next one.
    pub repository: RwLock<Arc<Repository>>,
}

impl AppState {
    pub fn new(gtfs_data_path: PathBuf, repository: Repository) -> Self {
        Self {
            gtfs_data_path,
            repository: RwLock::new(Arc::new(repository)),
        }
    }

    pub async fn repository(&self) -> Arc<Repository> {
        self.repository.read().await.clone()
    }
}
