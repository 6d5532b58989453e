//! Configuration, filesystem paths and logging bootstrap for coursegate.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_CREDENTIAL_TTL_SECS, DEFAULT_LISTEN_ADDR,
    DEFAULT_LOG_LEVEL, DEFAULT_PENDING_FLOW_TTL_SECS, MAX_TTL_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
