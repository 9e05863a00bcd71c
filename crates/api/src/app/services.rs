//! Service wiring shared by every handler.

use std::sync::Arc;

use propdesk_auth::{AccessEvaluator, CredentialExchange, Guard, SessionConfig};

use crate::store::SessionStore;

pub struct AppServices {
    pub access: Arc<AccessEvaluator>,
    pub guard: Guard,
    pub exchange: Arc<dyn CredentialExchange>,
    pub sessions: SessionStore,
    pub session_config: SessionConfig,
    pub secure_cookies: bool,
}

impl AppServices {
    pub fn new(
        access: AccessEvaluator,
        session_config: SessionConfig,
        exchange: Arc<dyn CredentialExchange>,
        secure_cookies: bool,
    ) -> Self {
        let access = Arc::new(access);
        Self {
            guard: Guard::new(access.clone()),
            sessions: SessionStore::new(access.clone(), session_config),
            access,
            exchange,
            session_config,
            secure_cookies,
        }
    }
}
