//! Tab bar gating.
//!
//! Users who chose "sign in later" can browse the feed but get the login
//! screen when they reach for the camera or their profile.

use crate::types::{Tab, TabDecision};

/// Decides what tapping `tab` should do.
#[uniffi::export]
pub fn decide_tab(tab: Tab, deferred_login: bool) -> TabDecision {
    match (tab, deferred_login) {
        (Tab::Feed, _) => TabDecision::Select,
        (Tab::Camera | Tab::Profile, true) => TabDecision::PresentLogin,
        (Tab::Camera, false) => TabDecision::ShowImagePicker,
        (Tab::Profile, false) => TabDecision::Select,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_is_always_selectable() {
        assert_eq!(decide_tab(Tab::Feed, false), TabDecision::Select);
        assert_eq!(decide_tab(Tab::Feed, true), TabDecision::Select);
    }

    #[test]
    fn test_deferred_login_gates_camera_and_profile() {
        assert_eq!(decide_tab(Tab::Camera, true), TabDecision::PresentLogin);
        assert_eq!(decide_tab(Tab::Profile, true), TabDecision::PresentLogin);
    }

    #[test]
    fn test_camera_opens_picker_instead_of_switching() {
        assert_eq!(decide_tab(Tab::Camera, false), TabDecision::ShowImagePicker);
        assert_eq!(decide_tab(Tab::Profile, false), TabDecision::Select);
    }
}
