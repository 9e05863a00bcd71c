//! Route/module guard decision.
//!
//! Screens declare the module they need; the guard turns the current session
//! state into a render/redirect decision. The HTTP layer maps outcomes onto
//! responses.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{AccessEvaluator, Module, Session, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Sign-in still in flight: render neither content nor a denial.
    Loading,
    /// Render the protected content for this session.
    Render(Arc<Session>),
    /// No usable session (never signed in, signed out or expired).
    RedirectToSignIn,
    /// Signed in, but the role lacks the module.
    Forbidden,
}

impl GuardOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            GuardOutcome::Loading => "loading",
            GuardOutcome::Render(_) => "render",
            GuardOutcome::RedirectToSignIn => "redirect_to_sign_in",
            GuardOutcome::Forbidden => "forbidden",
        }
    }
}

/// Guard over a shared [`AccessEvaluator`].
#[derive(Debug, Clone)]
pub struct Guard {
    access: Arc<AccessEvaluator>,
}

impl Guard {
    pub fn new(access: Arc<AccessEvaluator>) -> Self {
        Self { access }
    }

    pub fn access(&self) -> &AccessEvaluator {
        &self.access
    }

    /// Guard a screen that declares its required module.
    pub fn check_module(
        &self,
        state: &SessionState,
        required: &Module,
        now: DateTime<Utc>,
    ) -> GuardOutcome {
        self.check_with(state, now, |session| {
            self.access.has_module_access(&session.role, required)
        })
    }

    /// Guard a request path (the module is resolved from the route table).
    pub fn check_route(&self, state: &SessionState, path: &str, now: DateTime<Utc>) -> GuardOutcome {
        self.check_with(state, now, |session| {
            self.access.has_route_access(&session.role, path)
        })
    }

    /// Guard an endpoint that needs a live session but no particular module.
    pub fn check_session(&self, state: &SessionState, now: DateTime<Utc>) -> GuardOutcome {
        self.check_with(state, now, |_| true)
    }

    fn check_with(
        &self,
        state: &SessionState,
        now: DateTime<Utc>,
        allowed: impl FnOnce(&Session) -> bool,
    ) -> GuardOutcome {
        match state {
            SessionState::Authenticating { .. } => GuardOutcome::Loading,
            SessionState::Authenticated(session) if session.validate(now).is_ok() => {
                if allowed(session) {
                    GuardOutcome::Render(session.clone())
                } else {
                    GuardOutcome::Forbidden
                }
            }
            _ => GuardOutcome::RedirectToSignIn,
        }
    }
}
