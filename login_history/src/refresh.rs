use crate::warehouse::{SaveMode, WarehouseSession};
use std::fmt;

pub const LOGIN_HISTORY_SOURCE: &str = "SNOWFLAKE.ACCOUNT_USAGE.LOGIN_HISTORY";
pub const LOGIN_HISTORY_TABLE: &str = "loginhistory";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshStatus {
    Refreshed,
    Skipped,
}

impl RefreshStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStatus::Refreshed => "refresh ran successfully",
            RefreshStatus::Skipped => "table not refreshed",
        }
    }
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replaces the local `loginhistory` table with the account's login history.
///
/// With `should_refresh` false nothing touches the session.
#[tracing::instrument(skip(session))]
pub fn refresh_login_history<S>(
    session: &S,
    should_refresh: bool,
) -> Result<RefreshStatus, S::Error>
where
    S: WarehouseSession,
{
    if !should_refresh {
        tracing::info!("Login history refresh skipped");
        return Ok(RefreshStatus::Skipped);
    }

    let login_history = session.table(LOGIN_HISTORY_SOURCE)?;
    session.save_as_table(&login_history, LOGIN_HISTORY_TABLE, SaveMode::Overwrite)?;

    tracing::info!(
        source = LOGIN_HISTORY_SOURCE,
        target = LOGIN_HISTORY_TABLE,
        "Login history refreshed"
    );
    Ok(RefreshStatus::Refreshed)
}
