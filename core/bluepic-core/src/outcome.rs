//! Launch outcomes: everything the core tells the UI layer.

use serde::Serialize;

use crate::error::FeedFetchError;
use crate::types::FeedItem;

/// A decision or result published on the notification coordinator.
///
/// Observers match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// Login check passed: reveal the feed.
    GotPastLoginCheck,
    /// Present the login screen.
    UserNotAuthenticated,
    /// Connectivity precheck failed; `message` is user-facing.
    ServerUnreachable { message: String },
    /// Connectivity precheck passed and the pass ran. Observers retry the feed.
    ServerConnectionSucceeded,
    /// Show the app-launch loading indicator.
    FeedLoadingStarted,
    FeedFetchSucceeded { items: Vec<FeedItem> },
    FeedFetchFailed { error: FeedFetchError },
    /// A sign-in was persisted.
    UserSignedIn { display_name: String },
    UserSignedOut,
}

impl LaunchOutcome {
    /// Outcomes after which the login screen can be dismissed.
    pub fn passes_login_check(&self) -> bool {
        matches!(self, Self::GotPastLoginCheck | Self::UserSignedIn { .. })
    }

    /// The auth-decision outcomes, exactly one of which a reconciliation pass emits.
    pub fn is_auth_decision(&self) -> bool {
        matches!(self, Self::GotPastLoginCheck | Self::UserNotAuthenticated)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GotPastLoginCheck => "got_past_login_check",
            Self::UserNotAuthenticated => "user_not_authenticated",
            Self::ServerUnreachable { .. } => "server_unreachable",
            Self::ServerConnectionSucceeded => "server_connection_succeeded",
            Self::FeedLoadingStarted => "feed_loading_started",
            Self::FeedFetchSucceeded { .. } => "feed_fetch_succeeded",
            Self::FeedFetchFailed { .. } => "feed_fetch_failed",
            Self::UserSignedIn { .. } => "user_signed_in",
            Self::UserSignedOut => "user_signed_out",
        }
    }
}
