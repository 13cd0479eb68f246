pub mod config;
pub mod logging;
pub mod rest;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::settings::{Setting, Settings};
pub use session::{QueryResult, Session, SessionError};
