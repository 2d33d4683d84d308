//! Feed service that reads a JSON array of [`FeedItem`]s from disk.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use fs_err as fs;

use super::{FeedResult, FeedService};
use crate::error::FeedFetchError;
use crate::main_queue::Completion;
use crate::types::FeedItem;

#[derive(Debug, Clone)]
pub struct FileFeedService {
    path: PathBuf,
}

impl FileFeedService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> FeedResult {
        let content = fs::read_to_string(path)
            .map_err(|e| FeedFetchError::new(format!("feed unavailable: {}", e)))?;
        serde_json::from_str::<Vec<FeedItem>>(&content)
            .map_err(|e| FeedFetchError::new(format!("malformed feed: {}", e)))
    }
}

impl FeedService for FileFeedService {
    fn fetch_feed(&self, timeout: Duration, completion: Completion<FeedResult>) {
        let path = self.path.clone();
        thread::spawn(move || {
            let (tx, rx) = mpsc::channel();
            // A read stuck on a slow mount or a FIFO is abandoned, not joined.
            thread::spawn(move || {
                let _ = tx.send(Self::read(&path));
            });
            let result = match rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(FeedFetchError::new(format!(
                    "feed unavailable: timed out after {} ms",
                    timeout.as_millis()
                ))),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(FeedFetchError::new("feed unavailable: reader stopped"))
                }
            };
            match &result {
                Ok(items) => tracing::debug!(count = items.len(), "Feed read from disk"),
                Err(err) => tracing::warn!(error = %err, "Feed read failed"),
            }
            completion.complete(result);
        });
    }
}
