//! Session manager: the single owner of the current session.
//!
//! States:
//!
//! ```text
//! Unauthenticated ──sign_in──▶ Authenticating ──ok──▶ Authenticated ──time──▶ Expired
//!        ▲                          │                      │   ▲                 │
//!        └──────── rejected ────────┘                      │   └──── refresh ────┘
//!                                                          │
//!   any state ───────────────── sign_out ─────────────────▶ SignedOut
//! ```
//!
//! Every transition replaces the whole state under a short write lock; the
//! lock is never held across an `.await`. Responses that arrive for an
//! abandoned attempt are discarded.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use propdesk_core::AttemptId;

use crate::{
    AccessEvaluator, AuthError, CredentialExchange, Credentials, ExchangeResponse, Session,
    SessionConfig, TokenPair,
};

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// A sign-in exchange is in flight.
    Authenticating { attempt: AttemptId },
    Authenticated(Arc<Session>),
    /// The snapshot passed its expiry; it may still be refreshed until its
    /// ceiling, but must not be trusted.
    Expired(Arc<Session>),
    SignedOut,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating { .. } => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Expired(_) => "expired",
            SessionState::SignedOut => "signed_out",
        }
    }
}

/// Owns the session state machine for one client.
#[derive(Debug)]
pub struct SessionManager {
    access: Arc<AccessEvaluator>,
    config: SessionConfig,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(access: Arc<AccessEvaluator>, config: SessionConfig) -> Self {
        Self {
            access,
            config,
            state: RwLock::new(SessionState::Unauthenticated),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of the raw state (no expiry check).
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    /// Latest trusted session.
    ///
    /// An authenticated snapshot whose time window does not hold at `now`
    /// moves the state to `Expired` and fails.
    pub fn current(&self, now: DateTime<Utc>) -> Result<Arc<Session>, AuthError> {
        let session = match &*self.read() {
            SessionState::Authenticated(session) => session.clone(),
            SessionState::Expired(_) => return Err(AuthError::SessionExpired),
            _ => return Err(AuthError::Unauthenticated),
        };

        let reason = match session.validate(now) {
            Ok(()) => return Ok(session),
            Err(reason) => reason,
        };

        let mut state = self.write();
        if matches!(&*state, SessionState::Authenticated(s) if Arc::ptr_eq(s, &session)) {
            tracing::info!(user_id = %session.user.id, %reason, "session no longer valid");
            *state = SessionState::Expired(session);
        }
        Err(reason.into())
    }

    /// State at `now`, after applying lazy expiry.
    pub fn observe(&self, now: DateTime<Utc>) -> SessionState {
        match self.current(now) {
            Ok(session) => SessionState::Authenticated(session),
            Err(_) => self.state(),
        }
    }

    /// Sign in with credentials: exchange, role gate, snapshot.
    pub async fn sign_in(
        &self,
        exchange: &dyn CredentialExchange,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, AuthError> {
        let attempt = self.begin_sign_in();
        let result = exchange.login(credentials).await;
        self.complete_sign_in(attempt, result, now)
    }

    /// Enter `Authenticating`, abandoning any earlier attempt or session.
    pub fn begin_sign_in(&self) -> AttemptId {
        let attempt = AttemptId::new();
        *self.write() = SessionState::Authenticating { attempt };
        tracing::debug!(%attempt, "sign-in started");
        attempt
    }

    /// Apply the outcome of a sign-in exchange.
    ///
    /// Ignored (returns [`AuthError::Superseded`]) unless the manager is
    /// still waiting for exactly this attempt.
    pub fn complete_sign_in(
        &self,
        attempt: AttemptId,
        result: Result<ExchangeResponse, AuthError>,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, AuthError> {
        let mut state = self.write();
        if *state != (SessionState::Authenticating { attempt }) {
            tracing::warn!(%attempt, state = state.name(), "discarding stale sign-in response");
            return Err(AuthError::Superseded);
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::info!(%attempt, error = %err, "sign-in rejected");
                *state = SessionState::Unauthenticated;
                return Err(err);
            }
        };

        let role = response.user.role.clone();
        if !self.access.registry().is_allowed_role(&role) {
            tracing::warn!(
                user_id = %response.user.id,
                role = %role,
                "credentials accepted but role may not use this application"
            );
            *state = SessionState::Unauthenticated;
            return Err(AuthError::RoleNotAllowed { role });
        }

        let session = Arc::new(Session::issue(
            response.session_user(),
            role,
            response.organization(),
            response.tokens,
            &self.config,
            now,
        ));

        tracing::info!(
            user_id = %session.user.id,
            role = %session.role,
            organization_id = session.organization.as_ref().map(|o| o.id.as_str()),
            expires_at = %session.expires_at,
            "signed in"
        );

        *state = SessionState::Authenticated(session.clone());
        Ok(session)
    }

    /// Exchange the refresh token for a new pair and replace the snapshot.
    pub async fn refresh(
        &self,
        exchange: &dyn CredentialExchange,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, AuthError> {
        let base = self.refreshable(now)?;
        let result = exchange.refresh(base.refresh_token()).await;
        self.complete_refresh(&base, result, now)
    }

    /// Snapshot eligible for refresh at `now`.
    pub fn refreshable(&self, now: DateTime<Utc>) -> Result<Arc<Session>, AuthError> {
        let session = match &*self.read() {
            SessionState::Authenticated(session) | SessionState::Expired(session) => {
                session.clone()
            }
            _ => return Err(AuthError::Unauthenticated),
        };

        if !session.can_refresh(now) {
            let mut state = self.write();
            if let SessionState::Authenticated(current) = &*state {
                if Arc::ptr_eq(current, &session) {
                    *state = SessionState::Expired(session);
                }
            }
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    /// Apply the outcome of a refresh started from `base`.
    ///
    /// Ignored unless `base` is still the current snapshot.
    pub fn complete_refresh(
        &self,
        base: &Arc<Session>,
        result: Result<TokenPair, AuthError>,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, AuthError> {
        let mut state = self.write();
        let still_current = match &*state {
            SessionState::Authenticated(s) | SessionState::Expired(s) => Arc::ptr_eq(s, base),
            _ => false,
        };
        if !still_current {
            tracing::warn!(state = state.name(), "discarding stale refresh response");
            return Err(AuthError::Superseded);
        }

        match result {
            Ok(tokens) => {
                let session = Arc::new(base.refreshed(tokens, &self.config, now));
                tracing::info!(
                    user_id = %session.user.id,
                    expires_at = %session.expires_at,
                    "session refreshed"
                );
                *state = SessionState::Authenticated(session.clone());
                Ok(session)
            }
            Err(err) => {
                tracing::warn!(user_id = %base.user.id, error = %err, "session refresh failed");
                *state = SessionState::Expired(base.clone());
                Err(err)
            }
        }
    }

    /// Drop all session data. Valid from any state.
    pub fn sign_out(&self) {
        let mut state = self.write();
        if let SessionState::Authenticated(session) | SessionState::Expired(session) = &*state {
            tracing::info!(user_id = %session.user.id, "signed out");
        }
        *state = SessionState::SignedOut;
    }

    // State is only ever replaced whole, so a poisoned lock still holds a
    // consistent value.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;

    use super::*;
    use crate::session::tests::t0;
    use crate::{ExchangeUser, Role};
    use propdesk_core::{OrganizationId, UserId};

    /// Scripted credentials API.
    struct FakeExchange {
        login: Mutex<Vec<Result<ExchangeResponse, AuthError>>>,
        refresh: Mutex<Vec<Result<TokenPair, AuthError>>>,
    }

    impl FakeExchange {
        fn new() -> Self {
            Self {
                login: Mutex::new(Vec::new()),
                refresh: Mutex::new(Vec::new()),
            }
        }

        fn with_login(self, result: Result<ExchangeResponse, AuthError>) -> Self {
            self.login.lock().unwrap().push(result);
            self
        }

        fn with_refresh(self, result: Result<TokenPair, AuthError>) -> Self {
            self.refresh.lock().unwrap().push(result);
            self
        }
    }

    #[async_trait::async_trait]
    impl CredentialExchange for FakeExchange {
        async fn login(&self, _credentials: &Credentials) -> Result<ExchangeResponse, AuthError> {
            self.login.lock().unwrap().remove(0)
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair, AuthError> {
            self.refresh.lock().unwrap().remove(0)
        }
    }

    fn response(role: Role) -> ExchangeResponse {
        ExchangeResponse {
            user: ExchangeUser {
                id: UserId::parse("u-7").unwrap(),
                role,
                first_name: "Lena".to_string(),
                last_name: "Brandt".to_string(),
                email: "lena@example.com".to_string(),
            },
            tokens: tokens(1),
            organization_id: Some(OrganizationId::parse("org-3").unwrap()),
            organization_name: Some("Brandt Estates".to_string()),
        }
    }

    fn tokens(n: u32) -> TokenPair {
        TokenPair {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(AccessEvaluator::default()), SessionConfig::default())
    }

    fn creds() -> Credentials {
        Credentials::new("lena@example.com", "correct horse")
    }

    #[tokio::test]
    async fn successful_sign_in_authenticates() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ASSOCIATE_MANAGER)));

        let session = manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        assert_eq!(session.role, Role::ASSOCIATE_MANAGER);
        assert_eq!(session.require_organization().unwrap().as_str(), "org-3");
        assert_eq!(session.expires_at, t0() + Duration::hours(1));
        assert_eq!(manager.current(t0()).unwrap(), session);
        assert_eq!(manager.state().name(), "authenticated");
    }

    #[tokio::test]
    async fn rejected_credentials_return_to_unauthenticated() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Err(AuthError::invalid_credentials(None)));

        let err = manager.sign_in(&exchange, &creds(), t0()).await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn role_outside_allowed_set_never_yields_a_session() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::new("Tenant"))));

        let err = manager.sign_in(&exchange, &creds(), t0()).await.unwrap_err();

        assert_eq!(
            err,
            AuthError::RoleNotAllowed {
                role: Role::new("Tenant")
            }
        );
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(manager.current(t0()), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn response_after_sign_out_is_discarded() {
        let manager = manager();
        let attempt = manager.begin_sign_in();
        manager.sign_out();

        let result = manager.complete_sign_in(attempt, Ok(response(Role::ADMIN)), t0());

        assert_eq!(result, Err(AuthError::Superseded));
        assert_eq!(manager.state(), SessionState::SignedOut);
    }

    #[test]
    fn older_attempt_cannot_overwrite_newer_one() {
        let manager = manager();
        let first = manager.begin_sign_in();
        let second = manager.begin_sign_in();

        assert_eq!(
            manager.complete_sign_in(first, Ok(response(Role::ADMIN)), t0()),
            Err(AuthError::Superseded)
        );
        let session = manager
            .complete_sign_in(second, Ok(response(Role::MAINTENANCE)), t0())
            .unwrap();
        assert_eq!(session.role, Role::MAINTENANCE);
    }

    #[tokio::test]
    async fn expiry_is_detected_lazily() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ADMIN)));
        manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        // Nothing changes until someone looks.
        assert_eq!(manager.state().name(), "authenticated");

        let later = t0() + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(manager.current(later), Err(AuthError::SessionExpired));
        assert_eq!(manager.state().name(), "expired");
    }

    #[tokio::test]
    async fn observe_applies_expiry_before_reporting_state() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ADMIN)));
        let session = manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        assert_eq!(manager.observe(t0()), SessionState::Authenticated(session.clone()));
        assert_eq!(
            manager.observe(t0() + Duration::hours(2)),
            SessionState::Expired(session)
        );
    }

    #[tokio::test]
    async fn snapshot_issued_in_the_future_is_not_trusted() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ADMIN)));
        manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        let skewed = t0() - Duration::minutes(1);
        assert_eq!(manager.current(skewed), Err(AuthError::SessionExpired));
        assert_eq!(manager.state().name(), "expired");
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_wholesale() {
        let manager = manager();
        let exchange = FakeExchange::new()
            .with_login(Ok(response(Role::PROPERTY_MANAGER)))
            .with_refresh(Ok(tokens(2)));
        let original = manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        let later = t0() + Duration::minutes(90);
        assert!(manager.current(later).is_err());
        let refreshed = manager.refresh(&exchange, later).await.unwrap();

        assert_eq!(refreshed.access_token(), "access-2");
        assert_eq!(refreshed.user, original.user);
        assert_eq!(refreshed.max_age_at, original.max_age_at);
        assert_eq!(refreshed.expires_at, later + Duration::hours(1));
        // The old snapshot is untouched.
        assert_eq!(original.access_token(), "access-1");
        assert_eq!(manager.current(later).unwrap(), refreshed);
    }

    #[tokio::test]
    async fn failed_refresh_expires_session() {
        let manager = manager();
        let exchange = FakeExchange::new()
            .with_login(Ok(response(Role::ADMIN)))
            .with_refresh(Err(AuthError::invalid_credentials(Some("refresh token revoked".into()))));
        manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        let err = manager.refresh(&exchange, t0()).await.unwrap_err();

        assert_eq!(err.to_string(), "refresh token revoked");
        assert_eq!(manager.state().name(), "expired");
    }

    #[tokio::test]
    async fn refresh_past_ceiling_is_refused() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ADMIN)));
        manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        let err = manager
            .refresh(&exchange, t0() + Duration::hours(24))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpired);
        assert_eq!(manager.state().name(), "expired");
    }

    #[tokio::test]
    async fn refresh_response_after_sign_out_is_discarded() {
        let manager = manager();
        let exchange = FakeExchange::new().with_login(Ok(response(Role::ADMIN)));
        manager.sign_in(&exchange, &creds(), t0()).await.unwrap();

        let base = manager.refreshable(t0()).unwrap();
        manager.sign_out();

        assert_eq!(
            manager.complete_refresh(&base, Ok(tokens(2)), t0()),
            Err(AuthError::Superseded)
        );
        assert_eq!(manager.state(), SessionState::SignedOut);
    }

    #[test]
    fn refresh_requires_a_session() {
        let manager = manager();
        assert_eq!(manager.refreshable(t0()), Err(AuthError::Unauthenticated));
    }
}
