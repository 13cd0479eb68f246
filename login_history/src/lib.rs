pub mod cli;
pub mod connection;
pub mod parameters;
pub mod refresh;
pub mod warehouse;

pub use connection::{BuildError, build_connection, build_connection_from_file};
pub use parameters::ConnectionParameters;
pub use refresh::{RefreshStatus, refresh_login_history};
