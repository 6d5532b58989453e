//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!          ┌─────────────┐
//!          │   Unknown   │ (initial)
//!          └──────┬──────┘
//!                 │ Bootstrap
//!                 ▼
//!          ┌─────────────┐  NoCredential   ┌─────────────────┐
//!          │  Checking   │ ──────────────► │ Unauthenticated │
//!          └──────┬──────┘                 └─────────────────┘
//!                 │ CredentialFound                 ▲
//!                 ▼                                 │ ProfileRejected
//!          ┌─────────────────┐                      │ SessionRevoked
//!          │ FetchingProfile │ ─────────────────────┤ LogoutComplete
//!          └──────┬──────────┘                      │
//!                 │ ProfileLoaded / LoginSuccess    │
//!                 ▼                                 │
//!          ┌─────────────────┐ LogoutRequested ┌────┴───────┐
//!          │  Authenticated  │ ──────────────► │ LoggingOut │
//!          └─────────────────┘                 └────────────┘
//! ```
//!
//! A new navigation may restart a check from `Checking` or
//! `FetchingProfile`; the superseded check is then discarded as stale.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unknown)

    Unknown => {
        Bootstrap => Checking,
        LoginAttempt => LoggingIn,
        LogoutRequested => LoggingOut
    },
    Checking => {
        NoCredential => Unauthenticated,
        CredentialFound => FetchingProfile,
        Bootstrap => Checking
    },
    FetchingProfile => {
        ProfileLoaded => Authenticated,
        ProfileRejected => Unauthenticated,
        Bootstrap => Checking
    },
    Authenticated => {
        Bootstrap => Checking,
        LoginAttempt => LoggingIn,
        LogoutRequested => LoggingOut,
        SessionRevoked => Unauthenticated
    },
    Unauthenticated => {
        Bootstrap => Checking,
        LoginAttempt => LoggingIn,
        LogoutRequested => LoggingOut
    },
    LoggingIn => {
        LoginSuccess => Authenticated,
        LoginFailed => Unauthenticated
    },
    LoggingOut => {
        LogoutComplete => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption (CLI output, callbacks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unknown,
    Checking,
    FetchingProfile,
    Authenticated,
    Unauthenticated,
    LoggingIn,
    LoggingOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unknown => SessionState::Unknown,
            SessionMachineState::Checking => SessionState::Checking,
            SessionMachineState::FetchingProfile => SessionState::FetchingProfile,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::LoggingIn => SessionState::LoggingIn,
            SessionMachineState::LoggingOut => SessionState::LoggingOut,
        }
    }
}
