//! Interfaces to the services the core consumes but does not own.
//!
//! Every call is asynchronous in the same way: the collaborator gets a
//! [`Completion`] and finishes it from any thread, now or later. Implementors
//! should:
//! - Never block the calling thread for the network round-trip
//! - Honor the timeout they are given
//! - Report failures through the completion instead of panicking
//!
//! Add new reference implementations next to the existing ones.

mod file_feed;
mod scripted;
mod tcp;

pub use file_feed::FileFeedService;
pub use scripted::ScriptedIdentityProvider;
pub use tcp::{parse_server_address, ServerEndpoint, TcpProbe};

use std::time::Duration;

use crate::error::FeedFetchError;
use crate::main_queue::Completion;
use crate::types::{FeedItem, ProviderKind};

/// Result of a connectivity probe; the error is a diagnostic reason.
pub type ProbeResult = Result<(), String>;

pub type FeedResult = Result<Vec<FeedItem>, FeedFetchError>;

/// How a provider sign-in should be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMode {
    /// Show the provider's UI.
    Interactive,
    /// Restore a previous provider session without UI.
    Silent,
}

/// What a provider returned for its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub display_name: String,
    pub user_id: String,
    pub avatar_url: Option<String>,
}

/// Uniform result of a sign-in round-trip, whichever SDK produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    Success(ProviderIdentity),
    Failure(String),
    Cancelled,
}

/// External authentication service (Facebook, Google).
pub trait IdentityProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn sign_in(&self, mode: SignInMode, completion: Completion<SignInResult>);

    /// Ends the provider's own session. Local state is already cleared.
    fn sign_out(&self);
}

/// Photo feed source.
pub trait FeedService: Send + Sync {
    fn fetch_feed(&self, timeout: Duration, completion: Completion<FeedResult>);
}

/// Lightweight reachability check for the configured server.
pub trait ConnectivityProbe: Send + Sync {
    fn check(&self, address: &str, timeout: Duration, completion: Completion<ProbeResult>);
}
