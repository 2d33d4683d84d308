//! Authoritative record of who (if anyone) is signed in.
//!
//! `SessionState` owns the preference store and writes through to it on every
//! mutation, so the in-memory view and the persisted keys never drift:
//!
//! | key | meaning |
//! |---|---|
//! | `user_id` | provider-scoped id from the last sign-in |
//! | `user_name` | display name from the last sign-in |
//! | `signedInWith` | [`AuthState`] tag |
//! | `hasPressedLater` | deferred-login flag |
//!
//! The identity fields live inside [`SignedInUser`], so a display name without
//! an id (or either without a provider) cannot be represented.

use crate::error::Result;
use crate::preferences::{keys, PrefValue, PreferenceStore};
use crate::types::{AuthState, ProviderKind, SessionSnapshot};

const FACEBOOK_PICTURE_PREFIX: &str = "http://graph.facebook.com/";
const FACEBOOK_PICTURE_SUFFIX: &str = "/picture?type=large";

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub provider: ProviderKind,
    pub display_name: String,
    pub user_id: String,
}

pub struct SessionState {
    store: Box<dyn PreferenceStore>,
    user: Option<SignedInUser>,
    deferred_login: bool,
    /// Set once a provider sign-in completes in this process. Never persisted.
    live_provider_session: bool,
    avatar_url: Option<String>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("user", &self.user)
            .field("deferred_login", &self.deferred_login)
            .field("live_provider_session", &self.live_provider_session)
            .field("avatar_url", &self.avatar_url)
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Restores the session from `store`.
    ///
    /// A user is only considered signed in when id, name and a recognized
    /// signed-in tag are all present. Anything else fails closed to signed out.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let user = match restore_identity(store.as_ref()) {
            RestoredIdentity::SignedIn(user) => Some(user),
            RestoredIdentity::SignedOutTag => {
                tracing::debug!("Signed-out tag with leftover identity keys, ignoring them");
                None
            }
            RestoredIdentity::UnknownTag(tag) => {
                tracing::warn!(tag = %tag, "Unrecognized sign-in tag, treating as signed out");
                None
            }
            RestoredIdentity::Incomplete => None,
        };

        let deferred_login = store.get_bool(keys::HAS_PRESSED_LATER);
        tracing::debug!(
            auth_state = %user.as_ref().map_or(AuthState::SignedOut, |u| u.provider.signed_in_state()),
            deferred_login,
            "Session loaded"
        );

        Self {
            store,
            user,
            deferred_login,
            live_provider_session: false,
            avatar_url: None,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.user
            .as_ref()
            .map_or(AuthState::SignedOut, |user| user.provider.signed_in_state())
    }

    pub fn user(&self) -> Option<&SignedInUser> {
        self.user.as_ref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.display_name.as_str())
    }

    pub fn unique_user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.user_id.as_str())
    }

    pub fn deferred_login(&self) -> bool {
        self.deferred_login
    }

    /// Whether a live provider session exists in this process.
    pub fn has_live_provider_session(&self) -> bool {
        self.live_provider_session
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub fn preferences_mut(&mut self) -> &mut dyn PreferenceStore {
        self.store.as_mut()
    }

    /// Records a successful sign-in and clears the deferred-login flag.
    ///
    /// All four keys are written in one batch before the in-memory state
    /// changes. On a write failure neither the store nor the session changes.
    pub fn record_sign_in(
        &mut self,
        display_name: &str,
        user_id: &str,
        provider: ProviderKind,
        avatar_url: Option<String>,
    ) -> Result<()> {
        let state = provider.signed_in_state();
        self.store.apply_all(&[
            (keys::USER_ID, Some(PrefValue::from(user_id))),
            (keys::USER_NAME, Some(PrefValue::from(display_name))),
            (keys::SIGNED_IN_WITH, Some(PrefValue::from(state.tag()))),
            (keys::HAS_PRESSED_LATER, Some(PrefValue::Bool(false))),
        ])?;

        self.user = Some(SignedInUser {
            provider,
            display_name: display_name.to_string(),
            user_id: user_id.to_string(),
        });
        self.deferred_login = false;
        self.live_provider_session = true;
        self.avatar_url = avatar_url;

        tracing::info!(provider = %provider, "Sign-in recorded");
        Ok(())
    }

    /// Signs out locally and returns the provider that was signed in, if any.
    ///
    /// The in-memory session is cleared even if persisting fails.
    /// `deferred_login` is left untouched.
    pub fn record_sign_out(&mut self) -> Result<Option<ProviderKind>> {
        let previous = self.user.take().map(|user| user.provider);
        self.live_provider_session = false;
        self.avatar_url = None;

        self.store.apply_all(&[
            (keys::USER_ID, None),
            (keys::USER_NAME, None),
            (
                keys::SIGNED_IN_WITH,
                Some(PrefValue::from(AuthState::SignedOut.tag())),
            ),
        ])?;

        tracing::info!(previous = ?previous, "Sign-out recorded");
        Ok(previous)
    }

    /// Records that the user chose "sign in later". Auth state is unchanged.
    pub fn defer_login(&mut self) -> Result<()> {
        self.store
            .set(keys::HAS_PRESSED_LATER, PrefValue::Bool(true))?;
        self.deferred_login = true;
        Ok(())
    }

    /// Persisted Google sessions must be re-verified with a silent sign-in.
    pub fn needs_silent_reauth(&self) -> bool {
        self.auth_state() == AuthState::SignedInWithGoogle && !self.has_live_provider_session()
    }

    /// URL of the user's profile picture, or an empty string when unknown.
    pub fn profile_picture_url(&self) -> String {
        match &self.user {
            Some(user) => match user.provider {
                ProviderKind::Facebook => format!(
                    "{}{}{}",
                    FACEBOOK_PICTURE_PREFIX, user.user_id, FACEBOOK_PICTURE_SUFFIX
                ),
                ProviderKind::Google => self.avatar_url.clone().unwrap_or_default(),
            },
            None => String::new(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            auth_state: self.auth_state(),
            display_name: self.display_name().map(str::to_string),
            unique_user_id: self.unique_user_id().map(str::to_string),
            deferred_login: self.deferred_login,
            profile_picture_url: self.profile_picture_url(),
        }
    }
}

/// What the persisted identity keys amount to.
#[derive(Debug, PartialEq, Eq)]
enum RestoredIdentity {
    SignedIn(SignedInUser),
    /// Tag says `SignedOut`; any id or name left behind is ignored.
    SignedOutTag,
    UnknownTag(String),
    /// At least one of id, name or tag is missing.
    Incomplete,
}

fn restore_identity(store: &dyn PreferenceStore) -> RestoredIdentity {
    let user_id = store.get_string(keys::USER_ID);
    let user_name = store.get_string(keys::USER_NAME);
    let tag = store.get_string(keys::SIGNED_IN_WITH);

    let (Some(user_id), Some(display_name), Some(tag)) = (user_id, user_name, tag) else {
        return RestoredIdentity::Incomplete;
    };
    match AuthState::from_tag(&tag).map(|state| state.provider()) {
        Some(Some(provider)) => RestoredIdentity::SignedIn(SignedInUser {
            provider,
            display_name,
            user_id,
        }),
        Some(None) => RestoredIdentity::SignedOutTag,
        None => RestoredIdentity::UnknownTag(tag),
    }
}
