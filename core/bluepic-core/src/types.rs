//! Core types shared by every BluePic front end.
//!
//! **FFI Support:** Flat enums and records are annotated with UniFFI macros for
//! Swift/Kotlin bindings. Prefer additive changes to keep bindings stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════════

/// External identity providers the app can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
pub enum ProviderKind {
    Facebook,
    Google,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Google => "Google",
        }
    }

    /// The authentication state recorded after a successful sign-in.
    pub fn signed_in_state(&self) -> AuthState {
        match self {
            Self::Facebook => AuthState::SignedInWithFacebook,
            Self::Google => AuthState::SignedInWithGoogle,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Which provider (if any) the user is signed in with.
///
/// The variant names double as the persisted `signedInWith` tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Enum,
)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedInWithFacebook,
    SignedInWithGoogle,
}

impl AuthState {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SignedOut => "SignedOut",
            Self::SignedInWithFacebook => "SignedInWithFacebook",
            Self::SignedInWithGoogle => "SignedInWithGoogle",
        }
    }

    /// Parses a persisted tag. Unknown tags yield `None`; callers fail closed.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SignedOut" => Some(Self::SignedOut),
            "SignedInWithFacebook" => Some(Self::SignedInWithFacebook),
            "SignedInWithGoogle" => Some(Self::SignedInWithGoogle),
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::SignedOut => None,
            Self::SignedInWithFacebook => Some(ProviderKind::Facebook),
            Self::SignedInWithGoogle => Some(ProviderKind::Google),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        !matches!(self, Self::SignedOut)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Read-only view of the session for clients and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct SessionSnapshot {
    pub auth_state: AuthState,
    pub display_name: Option<String>,
    pub unique_user_id: Option<String>,
    pub deferred_login: bool,
    pub profile_picture_url: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Feed
// ═══════════════════════════════════════════════════════════════════════════════

/// A photo in the feed. Opaque to the reconciler; only relayed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub owner_name: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Navigation
// ═══════════════════════════════════════════════════════════════════════════════

/// Tabs of the main tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Feed,
    Camera,
    Profile,
}

/// What the tab bar should do when the user taps a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum TabDecision {
    /// Switch to the tab.
    Select,
    /// Stay put and present the login screen.
    PresentLogin,
    /// Stay put and show the camera picker.
    ShowImagePicker,
}
