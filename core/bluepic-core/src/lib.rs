//! # bluepic-core
//!
//! Session and launch logic for the BluePic photo client, shared by every
//! front end (iOS shell, command line driver).
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Collaborators finish work on
//!   their own threads and hand results back through the [`MainQueue`].
//! - **Single owner**: The [`SessionEngine`] is owned by one thread, which is the
//!   only place session state changes.
//! - **Graceful degradation**: Missing or corrupt preference and config files
//!   load as defaults; failures surface as [`LaunchOutcome`]s, not panics.
//! - **FFI-ready**: UniFFI annotations on the flat value types and free functions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bluepic_core::{Collaborators, SessionEngine, StorageConfig};
//!
//! let mut engine = SessionEngine::open(&StorageConfig::default(), collaborators)?;
//! engine.subscribe(|outcome| println!("{:?}", outcome));
//! engine.check_server_connection();
//! engine.run_until_idle(std::time::Duration::from_secs(30));
//! ```

// UniFFI scaffolding for Swift/Kotlin bindings
uniffi::setup_scaffolding!();

pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod main_queue;
pub mod navigation;
pub mod outcome;
pub mod preferences;
pub mod reconciler;
pub mod session;
pub mod storage;
pub mod types;

pub use collaborators::{
    ConnectivityProbe, FeedService, FileFeedService, IdentityProvider, ProviderIdentity,
    ScriptedIdentityProvider, SignInMode, SignInResult, TcpProbe,
};
pub use config::*;
pub use coordinator::{NotificationCoordinator, SubscriptionId};
pub use engine::{default_storage_root, read_session_snapshot, Collaborators, SessionEngine};
pub use error::{ConnectivityError, CoreError, FeedFetchError, Result, SessionFfiError};
pub use main_queue::{Completion, EngineRequest, MainQueue, MainQueueHandle, QueueMessage};
pub use navigation::decide_tab;
pub use outcome::LaunchOutcome;
pub use preferences::{JsonPreferenceStore, MemoryPreferenceStore, PrefValue, PreferenceStore};
pub use reconciler::LaunchReconciler;
pub use session::{SessionState, SignedInUser};
pub use storage::StorageConfig;
pub use types::*;
