//! Authentication and session layer for coursegate.
//!
//! This crate provides:
//! - A request gateway that attaches bearer tokens and runs a single-flight
//!   token refresh on `401`
//! - A session bootstrap gate backed by an explicit FSM
//! - The stateless route authorization policy shared by the edge server
//!   and the CLI

mod error;
mod gateway;
pub mod navigation;
mod profile;
mod refresh_lock;
pub mod route_policy;
mod session_fsm;
mod session_gate;

pub use error::{AuthError, AuthResult};
pub use gateway::{ApiRequest, ApiResponse, Gateway, SignOutCallback, REFRESH_PATH};
pub use profile::{CompletedLevel, CompletedSection, Role, User};
pub use refresh_lock::{RefreshGuard, RefreshLock};
pub use route_policy::{RouteContext, RouteDecision};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use session_gate::{
    GateOutcome, NavigationTicket, Session, SessionGate, SessionStateCallback, PROFILE_PATH,
};
