//! Bounded, opt-in redirect following.
//!
//! The transport consults [`RedirectPolicy::decide`] once per 3xx response.
//! A stop surfaces that redirect response as the final one instead of
//! replaying the request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

/// Outcome of one redirect decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Follow the `Location` of this response.
    Follow,
    /// Surface this response as the final one.
    Stop,
}

/// Redirect policy with a monotonic counter of redirects taken.
#[derive(Debug)]
pub struct RedirectPolicy {
    follow: bool,
    max_redirects: u32,
    taken: AtomicU32,
}

impl RedirectPolicy {
    /// Creates a policy; nothing is followed unless `follow` is set.
    #[must_use]
    pub fn new(follow: bool, max_redirects: u32) -> Self {
        Self {
            follow,
            max_redirects,
            taken: AtomicU32::new(0),
        }
    }

    /// Number of redirects followed so far. Never exceeds the maximum.
    #[must_use]
    pub fn redirects_taken(&self) -> u32 {
        self.taken.load(Ordering::SeqCst)
    }

    /// Decides whether the redirect response just received is followed.
    pub fn decide(&self) -> RedirectDecision {
        if !self.follow {
            debug!("redirect following disabled; surfacing redirect response");
            return RedirectDecision::Stop;
        }

        let max = self.max_redirects;
        match self
            .taken
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |taken| {
                (taken < max).then_some(taken + 1)
            }) {
            Ok(previous) => {
                debug!(taken = previous + 1, max, "following redirect");
                RedirectDecision::Follow
            }
            Err(taken) => {
                debug!(taken, max, "maximum redirects reached; surfacing redirect response");
                RedirectDecision::Stop
            }
        }
    }

    /// Wraps this policy as a reqwest redirect policy.
    #[must_use]
    pub fn to_reqwest(self: &Arc<Self>) -> reqwest::redirect::Policy {
        let policy = Arc::clone(self);
        reqwest::redirect::Policy::custom(move |attempt| match policy.decide() {
            RedirectDecision::Follow => attempt.follow(),
            RedirectDecision::Stop => attempt.stop(),
        })
    }
}
