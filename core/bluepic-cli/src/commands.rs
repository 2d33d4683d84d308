//! Session commands: status, sign-in, sign-out, later, server, tab.
//!
//! Each command opens an engine over the on-disk store, performs one action,
//! and returns the text to print.

use std::sync::Arc;
use std::time::Duration;

use bluepic_core::{
    Collaborators, CoreError, FileFeedService, IdentityProvider, ProviderIdentity, ProviderKind,
    ScriptedIdentityProvider, SessionEngine, SignInResult, StorageConfig, Tab, TcpProbe,
};
use serde_json::json;
use thiserror::Error;

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sign-in with {0} did not complete")]
    SignInIncomplete(ProviderKind),
}

pub type CliResult = Result<String, CliError>;

/// Builds an engine with the reference collaborators. `providers` replaces the
/// default (script-less) Facebook and Google providers.
pub fn open_engine(
    storage: &StorageConfig,
    feed: FileFeedService,
    providers: Vec<Arc<dyn IdentityProvider>>,
) -> Result<SessionEngine, CliError> {
    let mut all: Vec<Arc<dyn IdentityProvider>> = providers;
    for kind in [ProviderKind::Facebook, ProviderKind::Google] {
        if !all.iter().any(|p| p.kind() == kind) {
            all.push(Arc::new(ScriptedIdentityProvider::new(kind)));
        }
    }
    let collaborators = Collaborators {
        feed: Arc::new(feed),
        probe: Arc::new(TcpProbe::new()),
        providers: all,
    };
    Ok(SessionEngine::open(storage, collaborators)?)
}

fn engine(storage: &StorageConfig) -> Result<SessionEngine, CliError> {
    open_engine(storage, FileFeedService::new(storage.feed_file()), Vec::new())
}

fn snapshot_json(engine: &SessionEngine) -> CliResult {
    Ok(serde_json::to_string_pretty(&engine.snapshot())?)
}

pub fn status(storage: &StorageConfig) -> CliResult {
    let engine = engine(storage)?;
    let mut value = serde_json::to_value(engine.snapshot())?;
    value["server_url"] = json!(engine.server_address());
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn sign_in(
    storage: &StorageConfig,
    provider: ProviderKind,
    name: &str,
    id: &str,
    avatar: Option<String>,
) -> CliResult {
    let scripted = Arc::new(ScriptedIdentityProvider::new(provider));
    scripted.push_result(SignInResult::Success(ProviderIdentity {
        display_name: name.to_string(),
        user_id: id.to_string(),
        avatar_url: avatar,
    }));

    let providers: Vec<Arc<dyn IdentityProvider>> = vec![scripted];
    let mut engine = open_engine(storage, FileFeedService::new(storage.feed_file()), providers)?;
    engine.sign_in(provider);
    engine.run_until_idle(SIGN_IN_TIMEOUT);

    if engine.session().auth_state() != provider.signed_in_state() {
        return Err(CliError::SignInIncomplete(provider));
    }
    snapshot_json(&engine)
}

pub fn sign_out(storage: &StorageConfig) -> CliResult {
    let mut engine = engine(storage)?;
    engine.try_sign_out()?;
    snapshot_json(&engine)
}

pub fn later(storage: &StorageConfig) -> CliResult {
    let mut engine = engine(storage)?;
    engine.try_defer_login()?;
    snapshot_json(&engine)
}

pub fn server(storage: &StorageConfig, url: Option<&str>) -> CliResult {
    let mut engine = engine(storage)?;
    engine.set_server_address(url)?;
    Ok(serde_json::to_string_pretty(
        &json!({ "server_url": engine.server_address() }),
    )?)
}

pub fn tab(storage: &StorageConfig, tab: Tab) -> CliResult {
    let engine = engine(storage)?;
    Ok(serde_json::to_string_pretty(&json!({
        "tab": tab,
        "decision": engine.tab_decision(tab),
    }))?)
}
