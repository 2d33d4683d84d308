//! Identity provider that answers from a script instead of an SDK.
//!
//! Used by the command line driver (credentials come from flags) and by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{IdentityProvider, SignInMode, SignInResult};
use crate::main_queue::Completion;
use crate::types::ProviderKind;

pub struct ScriptedIdentityProvider {
    kind: ProviderKind,
    interactive: Mutex<VecDeque<SignInResult>>,
    silent: Mutex<VecDeque<SignInResult>>,
    /// Requests parked while `hold` is set.
    held: Mutex<Vec<(SignInMode, Completion<SignInResult>)>>,
    hold: Mutex<bool>,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl ScriptedIdentityProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            interactive: Mutex::new(VecDeque::new()),
            silent: Mutex::new(VecDeque::new()),
            held: Mutex::new(Vec::new()),
            hold: Mutex::new(false),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Queues the result of the next interactive sign-in.
    pub fn push_result(&self, result: SignInResult) -> &Self {
        lock(&self.interactive).push_back(result);
        self
    }

    /// Queues the result of the next silent sign-in.
    pub fn push_silent_result(&self, result: SignInResult) -> &Self {
        lock(&self.silent).push_back(result);
        self
    }

    /// Keep completions pending until `release_held` is called.
    pub fn set_hold(&self, hold: bool) {
        *lock(&self.hold) = hold;
    }

    /// Completes every held request, answering from the script.
    pub fn release_held(&self) {
        let held: Vec<_> = lock(&self.held).drain(..).collect();
        for (mode, completion) in held {
            let result = self.next_result(mode);
            completion.complete(result);
        }
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn next_result(&self, mode: SignInMode) -> SignInResult {
        let script = match mode {
            SignInMode::Interactive => &self.interactive,
            SignInMode::Silent => &self.silent,
        };
        lock(script)
            .pop_front()
            .unwrap_or_else(|| SignInResult::Failure(format!("no scripted {:?} result", mode)))
    }
}

impl IdentityProvider for ScriptedIdentityProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn sign_in(&self, mode: SignInMode, completion: Completion<SignInResult>) {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.hold) {
            lock(&self.held).push((mode, completion));
            return;
        }
        let result = self.next_result(mode);
        completion.complete(result);
    }

    fn sign_out(&self) {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(provider = %self.kind, "Scripted provider signed out");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ProviderIdentity;
    use crate::main_queue::{MainQueue, QueueMessage};

    fn completion(queue: &mut MainQueue) -> Completion<SignInResult> {
        queue.completion(
            |result| QueueMessage::SignInFinished {
                provider: ProviderKind::Facebook,
                result,
            },
            || SignInResult::Failure("dropped".to_string()),
        )
    }

    fn next_result(queue: &mut MainQueue) -> SignInResult {
        match queue.try_next() {
            Some(QueueMessage::SignInFinished { result, .. }) => result,
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_answers_from_script_then_fails() {
        let provider = ScriptedIdentityProvider::new(ProviderKind::Facebook);
        provider.push_result(SignInResult::Success(ProviderIdentity {
            display_name: "Ada".to_string(),
            user_id: "10153".to_string(),
            avatar_url: None,
        }));
        let mut queue = MainQueue::new();

        provider.sign_in(SignInMode::Interactive, completion(&mut queue));
        assert!(matches!(next_result(&mut queue), SignInResult::Success(_)));

        provider.sign_in(SignInMode::Interactive, completion(&mut queue));
        assert!(matches!(next_result(&mut queue), SignInResult::Failure(_)));
        assert_eq!(provider.sign_in_calls(), 2);
    }

    #[test]
    fn test_silent_and_interactive_scripts_are_separate() {
        let provider = ScriptedIdentityProvider::new(ProviderKind::Google);
        provider.push_silent_result(SignInResult::Cancelled);
        let mut queue = MainQueue::new();

        provider.sign_in(SignInMode::Interactive, completion(&mut queue));
        assert!(matches!(next_result(&mut queue), SignInResult::Failure(_)));

        provider.sign_in(SignInMode::Silent, completion(&mut queue));
        assert_eq!(next_result(&mut queue), SignInResult::Cancelled);
    }

    #[test]
    fn test_held_requests_wait_for_release() {
        let provider = ScriptedIdentityProvider::new(ProviderKind::Facebook);
        provider.push_result(SignInResult::Cancelled);
        provider.set_hold(true);
        let mut queue = MainQueue::new();

        provider.sign_in(SignInMode::Interactive, completion(&mut queue));
        assert!(queue.try_next().is_none());

        provider.release_held();
        assert_eq!(next_result(&mut queue), SignInResult::Cancelled);
    }
}
