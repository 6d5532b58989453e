//! Session bootstrap gate.
//!
//! Decides per navigation whether the caller has a session, fetching the
//! profile through the gateway when a credential exists but no user is
//! loaded. The gate owns the in-memory [`Session`] and its persisted
//! snapshot; tokens stay with the [`TokenStore`](coursegate_storage::TokenStore).

use crate::gateway::{ApiRequest, Gateway};
use crate::profile::{Role, User};
use crate::route_policy::is_public_path;
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::{navigation, AuthError, AuthResult};
use coursegate_storage::{StorageKeys, TokenKind};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Profile endpoint.
pub const PROFILE_PATH: &str = "/auth/me";

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionState) + Send + Sync>;

/// Client-side session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub role: Option<Role>,
}

impl Session {
    fn for_user(user: User) -> Self {
        Self {
            role: Some(user.role),
            user: Some(user),
        }
    }
}

/// Identifies one navigation. Results of superseded navigations are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTicket(u64);

/// What the caller should do with the page it was about to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Render,
    Redirect(&'static str),
    /// A newer navigation started while this check was running.
    Stale,
}

pub struct SessionGate {
    gateway: Arc<Gateway>,
    fsm: Mutex<SessionMachine>,
    session: RwLock<Session>,
    navigation: AtomicU64,
    state_callback: Mutex<Option<SessionStateCallback>>,
}

impl SessionGate {
    /// Create the gate, rehydrating the session snapshot and subscribing to
    /// gateway sign-outs.
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        let session = gateway
            .tokens()
            .get_json::<Session>(StorageKeys::SESSION)
            .unwrap_or_default();

        let gate = Arc::new(Self {
            gateway: gateway.clone(),
            fsm: Mutex::new(SessionMachine::new()),
            session: RwLock::new(session),
            navigation: AtomicU64::new(0),
            state_callback: Mutex::new(None),
        });

        let weak = Arc::downgrade(&gate);
        gateway.on_sign_out(move || {
            if let Some(gate) = weak.upgrade() {
                gate.handle_sign_out();
            }
        });

        gate
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().state())
    }

    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session.read().user.clone()
    }

    /// Start a navigation, superseding any in-flight check.
    pub fn begin_navigation(&self) -> NavigationTicket {
        NavigationTicket(self.navigation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: NavigationTicket) -> bool {
        self.navigation.load(Ordering::SeqCst) == ticket.0
    }

    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(old_state = ?old_state, new_state = ?new_state, "Session state transition");
            if let Some(callback) = self.state_callback.lock().as_ref() {
                callback(new_state);
            }
        }

        Ok(new_state)
    }

    /// Run the bootstrap check for a navigation to `path`.
    ///
    /// A check that overlaps a login or logout is `Stale`: that flow decides
    /// the session.
    pub async fn check(&self, path: &str) -> AuthResult<GateOutcome> {
        if matches!(self.state(), SessionState::LoggingIn | SessionState::LoggingOut) {
            debug!(path, "Login or logout in progress, skipping session check");
            return Ok(GateOutcome::Stale);
        }

        let ticket = self.begin_navigation();

        if self.state().is_authenticated() && self.session.read().user.is_some() {
            return Ok(GateOutcome::Render);
        }

        self.transition(&SessionMachineInput::Bootstrap)?;

        if self.gateway.tokens().get(TokenKind::Access).is_none() {
            debug!(path, "No access token");
            self.transition(&SessionMachineInput::NoCredential)?;
            self.reset_session();
            return Ok(Self::unauthenticated_outcome(path));
        }

        self.transition(&SessionMachineInput::CredentialFound)?;

        let result = self
            .gateway
            .send_json::<Option<User>>(&ApiRequest::get(PROFILE_PATH))
            .await;

        if !self.is_current(ticket) {
            debug!(path, "Discarding stale session check");
            return Ok(GateOutcome::Stale);
        }

        match result {
            Ok(Some(user)) => {
                self.transition(&SessionMachineInput::ProfileLoaded)?;
                info!(user_id = %user.id, role = %user.role, "Session established");
                self.establish(user);
                Ok(GateOutcome::Render)
            }
            Ok(None) => {
                info!("Profile endpoint returned no user, discarding credentials");
                self.transition(&SessionMachineInput::ProfileRejected)?;
                self.discard_credentials();
                Ok(Self::unauthenticated_outcome(path))
            }
            Err(AuthError::SessionExpired) => {
                // The gateway already cleared the tokens when it signed out.
                info!("Session expired during profile fetch");
                self.transition(&SessionMachineInput::ProfileRejected)?;
                self.clear_session_state();
                Ok(Self::unauthenticated_outcome(path))
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, discarding credentials");
                self.transition(&SessionMachineInput::ProfileRejected)?;
                self.discard_credentials();
                Ok(Self::unauthenticated_outcome(path))
            }
        }
    }

    fn unauthenticated_outcome(path: &str) -> GateOutcome {
        if is_public_path(path) {
            GateOutcome::Render
        } else {
            GateOutcome::Redirect(navigation::LOGIN)
        }
    }

    // ==========================================
    // Login / logout
    // ==========================================

    pub fn begin_login(&self) -> AuthResult<()> {
        self.begin_navigation();
        self.transition(&SessionMachineInput::LoginAttempt)?;
        Ok(())
    }

    /// Store the credentials and profile of a successful login.
    ///
    /// Returns the landing page for the user's role.
    pub fn complete_login(&self, access_token: &str, refresh_token: &str, user: User) -> AuthResult<&'static str> {
        if let Err(e) = self.gateway.tokens().set(access_token, refresh_token) {
            self.fail_login();
            return Err(e.into());
        }

        self.transition(&SessionMachineInput::LoginSuccess)?;
        let landing = if user.role.is_admin() {
            navigation::ADMIN_USERS
        } else {
            navigation::HOME
        };
        info!(user_id = %user.id, role = %user.role, "Logged in");
        self.establish(user);
        Ok(landing)
    }

    pub fn fail_login(&self) {
        if let Err(e) = self.transition(&SessionMachineInput::LoginFailed) {
            debug!(error = %e, "Login failure outside of a login attempt");
        }
    }

    /// Clear tokens, role and session. Returns the login page.
    pub fn logout(&self) -> &'static str {
        self.begin_navigation();
        let logging_out = self.transition(&SessionMachineInput::LogoutRequested).is_ok();

        self.discard_credentials();

        if logging_out {
            if let Err(e) = self.transition(&SessionMachineInput::LogoutComplete) {
                warn!(error = %e, "Logout did not complete cleanly");
            }
        }
        info!("Logged out");
        navigation::LOGIN
    }

    /// Replace the session user after a profile refetch.
    pub fn update_user(&self, user: User) {
        self.establish(user);
    }

    // ==========================================
    // Session state
    // ==========================================

    fn establish(&self, user: User) {
        let tokens = self.gateway.tokens();
        if let Err(e) = tokens.set_role(user.role.as_str()) {
            warn!(error = %e, "Failed to store role hint");
        }

        let session = Session::for_user(user);
        if let Err(e) = tokens.put_session_json(StorageKeys::SESSION, &session) {
            warn!(error = %e, "Failed to persist session snapshot");
        }
        *self.session.write() = session;
    }

    fn reset_session(&self) {
        *self.session.write() = Session::default();
        if let Err(e) = self.gateway.tokens().remove(StorageKeys::SESSION) {
            warn!(error = %e, "Failed to remove session snapshot");
        }
    }

    fn discard_credentials(&self) {
        if let Err(e) = self.gateway.tokens().clear() {
            warn!(error = %e, "Failed to clear credentials");
        }
        self.clear_session_state();
    }

    /// Role hint and session, leaving tokens alone.
    fn clear_session_state(&self) {
        if let Err(e) = self.gateway.tokens().clear_role() {
            warn!(error = %e, "Failed to clear role hint");
        }
        self.reset_session();
    }

    /// The gateway gave up on the session; tokens are already gone.
    fn handle_sign_out(&self) {
        if self.state().is_authenticated() {
            if let Err(e) = self.transition(&SessionMachineInput::SessionRevoked) {
                warn!(error = %e, "Could not demote session");
            }
        }
        self.clear_session_state();
    }
}
