//! Backend client shared by every resource module.

use coursegate_auth::{Gateway, SessionGate};
use coursegate_storage::TokenStore;
use std::sync::Arc;

/// Typed client over the authenticated gateway.
///
/// Resource operations live in `auth`, `users`, `levels`, `sections` and
/// `progress` as `impl Client` blocks.
#[derive(Clone)]
pub struct Client {
    gate: Arc<SessionGate>,
}

impl Client {
    pub fn new(gate: Arc<SessionGate>) -> Self {
        Self { gate }
    }

    /// Build the gateway and session gate over `tokens`.
    pub fn connect(api_base_url: &str, tokens: TokenStore) -> Self {
        let gateway = Arc::new(Gateway::new(api_base_url, tokens));
        Self::new(SessionGate::new(gateway))
    }

    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        self.gate.gateway()
    }

    pub fn tokens(&self) -> &TokenStore {
        self.gateway().tokens()
    }
}
