//! `bluepic launch`: one app activation, end to end.
//!
//! ```bash
//! bluepic server http://photos.local:8090
//! bluepic launch --feed ./feed.json
//! ```
//!
//! Prints one JSON line per published outcome, in publication order.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bluepic_core::{FileFeedService, LaunchOutcome, StorageConfig};

use crate::commands::{open_engine, CliResult};

/// Slack on top of the configured timeouts before giving up on collaborators.
const IDLE_MARGIN: Duration = Duration::from_secs(1);

pub fn run(storage: &StorageConfig, feed: Option<PathBuf>) -> CliResult {
    let feed = FileFeedService::new(feed.unwrap_or_else(|| storage.feed_file()));
    let mut engine = open_engine(storage, feed, Vec::new())?;

    let published: Arc<Mutex<Vec<LaunchOutcome>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);
    engine.subscribe(move |outcome| {
        sink.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(outcome.clone());
    });

    engine.request_loading_indicator();
    engine.check_server_connection();

    let budget = engine.config().probe_timeout() + engine.config().feed_timeout() + IDLE_MARGIN;
    if !engine.run_until_idle(budget) {
        tracing::warn!(pending = engine.pending(), "Launch finished with work outstanding");
    }

    let outcomes = published
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let lines = outcomes
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands;
    use serde_json::Value;
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn outcomes(output: &str) -> Vec<Value> {
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn names(output: &str) -> Vec<String> {
        outcomes(output)
            .iter()
            .map(|o| o["outcome"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_launch_without_server() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let output = run(&storage, None).unwrap();
        let outcomes = outcomes(&output);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0]["outcome"], "feed_loading_started");
        assert_eq!(outcomes[1]["outcome"], "server_unreachable");
        assert_eq!(outcomes[1]["message"], "Server is not set");
    }

    #[test]
    fn test_launch_against_local_server() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        commands::server(&storage, Some(&address)).unwrap();
        commands::later(&storage).unwrap();

        let feed = temp.path().join("photos.json");
        fs_err::write(
            &feed,
            r#"[{"id": "p1", "title": "Harbor", "image_url": "http://img/p1.jpg"}]"#,
        )
        .unwrap();

        let output = run(&storage, Some(feed)).unwrap();
        let names = names(&output);
        assert_eq!(
            names[..3],
            ["feed_loading_started", "got_past_login_check", "server_connection_succeeded"]
        );
        assert_eq!(names.last().map(String::as_str), Some("feed_fetch_succeeded"));
        assert_eq!(outcomes(&output)[3]["items"][0]["title"], "Harbor");
    }

    #[test]
    fn test_launch_with_missing_feed_reports_failure() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        commands::server(
            &storage,
            Some(&format!("http://{}", listener.local_addr().unwrap())),
        )
        .unwrap();

        let output = run(&storage, None).unwrap();
        let names = names(&output);
        assert!(names.contains(&"user_not_authenticated".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("feed_fetch_failed"));
    }
}
