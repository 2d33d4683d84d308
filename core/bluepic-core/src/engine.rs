//! SessionEngine - the composition root for BluePic clients.
//!
//! Owns the session, the reconciler, the notification coordinator, the main
//! queue and the collaborators. There are no globals: a client builds one
//! engine at startup and keeps it for the life of the process.
//!
//! - **Synchronous**: No async runtime required; collaborators finish on their
//!   own threads and results come back through the main queue
//! - **Single-threaded state**: Only the thread calling `pump` mutates the session
//! - **Never fails a launch**: Every failure is published as a [`LaunchOutcome`]
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use bluepic_core::{SessionEngine, StorageConfig};
//!
//! let mut engine = SessionEngine::open(&StorageConfig::default(), collaborators)?;
//! engine.subscribe(|outcome| println!("{}", outcome.name()));
//! engine.request_loading_indicator();
//! engine.check_server_connection();
//! engine.run_until_idle(Duration::from_secs(30));
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collaborators::{
    ConnectivityProbe, FeedService, IdentityProvider, SignInMode, SignInResult,
};
use crate::config::{load_launch_config, LaunchConfig};
use crate::coordinator::{NotificationCoordinator, SubscriptionId};
use crate::error::{ConnectivityError, FeedFetchError, Result, SessionFfiError};
use crate::main_queue::{EngineRequest, MainQueue, MainQueueHandle, QueueMessage};
use crate::navigation::decide_tab;
use crate::outcome::LaunchOutcome;
use crate::preferences::{keys, JsonPreferenceStore};
use crate::reconciler::LaunchReconciler;
use crate::session::SessionState;
use crate::storage::StorageConfig;
use crate::types::{ProviderKind, SessionSnapshot, Tab, TabDecision};

/// The external services an engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub feed: Arc<dyn FeedService>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub providers: Vec<Arc<dyn IdentityProvider>>,
}

pub struct SessionEngine {
    session: SessionState,
    reconciler: LaunchReconciler,
    coordinator: NotificationCoordinator,
    queue: MainQueue,
    collaborators: Collaborators,
    config: LaunchConfig,
    sign_ins_in_flight: HashSet<ProviderKind>,
}

impl SessionEngine {
    pub fn new(session: SessionState, collaborators: Collaborators, config: LaunchConfig) -> Self {
        Self {
            session,
            reconciler: LaunchReconciler::new(),
            coordinator: NotificationCoordinator::new(),
            queue: MainQueue::new(),
            collaborators,
            config,
            sign_ins_in_flight: HashSet::new(),
        }
    }

    /// Builds an engine over the JSON preference store and config under `storage`.
    pub fn open(storage: &StorageConfig, collaborators: Collaborators) -> Result<Self> {
        let store = JsonPreferenceStore::load(&storage.preferences_file())?;
        let session = SessionState::load(Box::new(store));
        Ok(Self::new(session, collaborators, load_launch_config(storage)))
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Sender for observers that need to request follow-up work.
    pub fn handle(&self) -> MainQueueHandle {
        self.queue.handle()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&LaunchOutcome) + Send + 'static,
    {
        self.coordinator.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.coordinator.unsubscribe(id)
    }

    pub fn server_address(&self) -> Option<String> {
        self.session.preferences().get_string(keys::SERVER_URL)
    }

    /// Stores (or with `None`, clears) the server address.
    pub fn set_server_address(&mut self, address: Option<&str>) -> Result<()> {
        let store = self.session.preferences_mut();
        match address.map(str::trim).filter(|a| !a.is_empty()) {
            Some(address) => store.set(keys::SERVER_URL, address.into()),
            None => store.remove(keys::SERVER_URL),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Launch
    // ─────────────────────────────────────────────────────────────────────────────

    /// Connectivity precheck. On success the reconciliation pass follows.
    pub fn check_server_connection(&mut self) {
        let address = self.server_address();
        let address = match LaunchReconciler::precheck(address.as_deref()) {
            Ok(address) => address.to_string(),
            Err(err) => {
                tracing::info!(error = %err, "Connectivity precheck failed");
                self.publish(LaunchOutcome::ServerUnreachable {
                    message: err.to_string(),
                });
                return;
            }
        };

        tracing::debug!(address = %address, "Probing server");
        let probe = Arc::clone(&self.collaborators.probe);
        let reported = address.clone();
        let completion = self.queue.completion(
            move |result| QueueMessage::ConnectivityChecked {
                address: reported,
                result,
            },
            || Err("probe dropped the request".to_string()),
        );
        probe.check(&address, self.config.probe_timeout(), completion);
    }

    /// Runs the reconciliation pass unless one already ran this activation.
    ///
    /// Returns whether a pass ran.
    pub fn present_login(&mut self) -> bool {
        if !self.reconciler.begin_pass() {
            return false;
        }

        self.issue_feed_fetch();

        let decision = LaunchReconciler::decide_auth(
            self.session.auth_state(),
            self.session.deferred_login(),
        );
        tracing::info!(
            auth_state = %self.session.auth_state(),
            deferred_login = self.session.deferred_login(),
            decision = decision.name(),
            "Login check decided"
        );
        self.publish(decision);
        true
    }

    /// Re-arms the once-per-activation guard.
    pub fn reset_cycle(&mut self) {
        self.reconciler.reset_cycle();
    }

    /// Re-issues the feed fetch only.
    pub fn retry_feed(&mut self) {
        self.issue_feed_fetch();
    }

    /// Publishes `FeedLoadingStarted` unless the feed already loaded once.
    pub fn request_loading_indicator(&mut self) {
        if self.reconciler.wants_loading_indicator() {
            self.publish(LaunchOutcome::FeedLoadingStarted);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts an interactive sign-in. Returns false if one is already pending
    /// for `provider` or no such provider is registered.
    pub fn sign_in(&mut self, provider: ProviderKind) -> bool {
        self.start_sign_in(provider, SignInMode::Interactive)
    }

    /// Called when the login screen appears. Restored Google sessions are
    /// re-verified silently; returns true if that attempt started.
    pub fn login_screen_opened(&mut self) -> bool {
        if !self.session.needs_silent_reauth() {
            return false;
        }
        self.start_sign_in(ProviderKind::Google, SignInMode::Silent)
    }

    pub fn sign_out(&mut self) {
        if let Err(err) = self.try_sign_out() {
            tracing::warn!(error = %err, "Failed to persist sign-out");
        }
    }

    /// Signs out and reports whether the sign-out was persisted.
    ///
    /// The session, the provider and observers are signed out either way.
    pub fn try_sign_out(&mut self) -> Result<()> {
        let previous = self.session.auth_state().provider();
        let persisted = self.session.record_sign_out();

        if let Some(kind) = previous {
            match self.provider(kind) {
                Some(provider) => provider.sign_out(),
                None => tracing::warn!(provider = %kind, "No identity provider registered"),
            }
        }
        self.publish(LaunchOutcome::UserSignedOut);
        persisted.map(|_| ())
    }

    pub fn defer_login(&mut self) {
        if let Err(err) = self.try_defer_login() {
            tracing::warn!(error = %err, "Failed to persist deferred login");
        }
    }

    pub fn try_defer_login(&mut self) -> Result<()> {
        self.session.defer_login()
    }

    pub fn tab_decision(&self, tab: Tab) -> TabDecision {
        decide_tab(tab, self.session.deferred_login())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Main queue
    // ─────────────────────────────────────────────────────────────────────────────

    /// Completions still outstanding.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Handles everything already queued without blocking. Returns the count handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(message) = self.queue.try_next() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Pumps until no completions are outstanding or `timeout` passes.
    ///
    /// Returns false on timeout.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.queue.pending() == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    pending = self.queue.pending(),
                    "Timed out waiting for collaborators"
                );
                return false;
            }
            if let Some(message) = self.queue.next_timeout(deadline - now) {
                self.dispatch(message);
            }
        }
    }

    fn dispatch(&mut self, message: QueueMessage) {
        match message {
            QueueMessage::ConnectivityChecked { address, result } => match result {
                Ok(()) => {
                    tracing::info!(address = %address, "Server reachable");
                    self.present_login();
                    self.publish(LaunchOutcome::ServerConnectionSucceeded);
                }
                Err(reason) => {
                    tracing::warn!(address = %address, reason = %reason, "Server unreachable");
                    let err = ConnectivityError::ProbeFailed { address, reason };
                    self.publish(LaunchOutcome::ServerUnreachable {
                        message: err.to_string(),
                    });
                }
            },
            QueueMessage::FeedFetched(Ok(items)) => {
                self.reconciler.record_feed_success();
                self.publish(LaunchOutcome::FeedFetchSucceeded { items });
            }
            QueueMessage::FeedFetched(Err(error)) => {
                self.publish(LaunchOutcome::FeedFetchFailed { error });
            }
            QueueMessage::SignInFinished { provider, result } => {
                self.sign_ins_in_flight.remove(&provider);
                self.finish_sign_in(provider, result);
            }
            QueueMessage::Request(request) => self.handle_request(request),
        }
    }

    fn handle_request(&mut self, request: EngineRequest) {
        tracing::debug!(?request, "Handling queued request");
        match request {
            EngineRequest::CheckServerConnection => self.check_server_connection(),
            EngineRequest::PresentLogin => {
                self.present_login();
            }
            EngineRequest::RetryFeed => self.retry_feed(),
            EngineRequest::ShowLoadingIndicator => self.request_loading_indicator(),
            EngineRequest::SignIn(provider) => {
                self.sign_in(provider);
            }
            EngineRequest::SignOut => self.sign_out(),
            EngineRequest::DeferLogin => self.defer_login(),
        }
    }

    fn finish_sign_in(&mut self, provider: ProviderKind, result: SignInResult) {
        match result {
            SignInResult::Success(identity) => {
                let recorded = self.session.record_sign_in(
                    &identity.display_name,
                    &identity.user_id,
                    provider,
                    identity.avatar_url,
                );
                match recorded {
                    Ok(()) => self.publish(LaunchOutcome::UserSignedIn {
                        display_name: identity.display_name,
                    }),
                    Err(err) => {
                        tracing::warn!(provider = %provider, error = %err, "Failed to persist sign-in")
                    }
                }
            }
            SignInResult::Failure(reason) => {
                tracing::warn!(provider = %provider, reason = %reason, "Sign-in failed");
            }
            SignInResult::Cancelled => {
                tracing::info!(provider = %provider, "Sign-in cancelled");
            }
        }
    }

    fn start_sign_in(&mut self, kind: ProviderKind, mode: SignInMode) -> bool {
        if self.sign_ins_in_flight.contains(&kind) {
            tracing::debug!(provider = %kind, "Sign-in already in flight, ignoring");
            return false;
        }
        let Some(provider) = self.provider(kind) else {
            tracing::warn!(provider = %kind, "No identity provider registered");
            return false;
        };

        self.sign_ins_in_flight.insert(kind);
        let completion = self.queue.completion(
            move |result| QueueMessage::SignInFinished {
                provider: kind,
                result,
            },
            || SignInResult::Failure("provider dropped the request".to_string()),
        );
        tracing::debug!(provider = %kind, ?mode, "Starting sign-in");
        provider.sign_in(mode, completion);
        true
    }

    fn issue_feed_fetch(&mut self) {
        let feed = Arc::clone(&self.collaborators.feed);
        let completion = self.queue.completion(QueueMessage::FeedFetched, || {
            Err(FeedFetchError::new("feed service dropped the request"))
        });
        feed.fetch_feed(self.config.feed_timeout(), completion);
    }

    fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn IdentityProvider>> {
        self.collaborators
            .providers
            .iter()
            .find(|provider| provider.kind() == kind)
            .cloned()
    }

    fn publish(&mut self, outcome: LaunchOutcome) {
        self.coordinator.publish(&outcome);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FFI
// ─────────────────────────────────────────────────────────────────────────────

/// Reads the persisted session under `root` without building an engine.
#[uniffi::export]
pub fn read_session_snapshot(root: String) -> std::result::Result<SessionSnapshot, SessionFfiError> {
    let storage = StorageConfig::with_root(root.into());
    let store = JsonPreferenceStore::load(&storage.preferences_file())?;
    Ok(SessionState::load(Box::new(store)).snapshot())
}

/// Default storage root (`~/.bluepic`).
#[uniffi::export]
pub fn default_storage_root() -> String {
    StorageConfig::default()
        .root()
        .to_string_lossy()
        .to_string()
}
